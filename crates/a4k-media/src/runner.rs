//! External process runner.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::command::{check_program, Invocation};
use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, FfmpegProgress};

/// Number of stderr lines kept for error reports.
pub const STDERR_TAIL_LINES: usize = 50;

/// Runs one invocation to completion, single attempt.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run an invocation and wait for it to exit.
    pub async fn run(&self, invocation: &Invocation) -> MediaResult<()> {
        self.run_with_progress(invocation, |_| {}).await
    }

    /// Run an invocation with a progress callback.
    ///
    /// The callback only fires for invocations that report `-progress pipe:2` records.
    pub async fn run_with_progress<F>(
        &self,
        invocation: &Invocation,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_program(&invocation.program)?;

        let program = invocation.program_name();
        debug!("Running {}", invocation);

        // kill_on_drop reaps the child if this future is dropped mid-run
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr was not captured"))?;
        let reports_progress = invocation.reports_progress;
        let log_program = program.clone();

        let stderr_handle = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut current = FfmpegProgress::default();
            let mut callback_alive = true;

            // Drain until EOF; closing the pipe early would SIGPIPE the child
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(program = %log_program, "Failed to read stderr: {}", e);
                        break;
                    }
                }

                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);

                if reports_progress && is_progress_line(line) {
                    if let Some(progress) = parse_progress_line(line, &mut current) {
                        if callback_alive
                            && panic::catch_unwind(AssertUnwindSafe(|| progress_callback(progress)))
                                .is_err()
                        {
                            warn!(
                                program = %log_program,
                                "Progress callback panicked, progress disabled"
                            );
                            callback_alive = false;
                        }
                    }
                    continue;
                }

                debug!(program = %log_program, "{}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }

            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let status = child.wait().await?;
        let stderr = match stderr_handle.await {
            Ok(stderr) => stderr,
            Err(e) => {
                warn!(program = %program, "stderr reader task failed: {}", e);
                String::new()
            }
        };

        if status.success() {
            info!("{} finished successfully", program);
            return Ok(());
        }

        Err(MediaError::process_failed(
            program,
            status.code(),
            (!stderr.trim().is_empty()).then_some(stderr),
        ))
    }
}
