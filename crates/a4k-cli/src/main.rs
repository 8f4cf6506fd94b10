//! Anime4K upscaling command-line tool.

mod cli;
mod commands;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use a4k_media::MediaError;

use crate::cli::{Cli, Command};
use crate::commands::JobKind;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "a4k_media=info,anime4k=info";

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        if let Some(stderr) = e.downcast_ref::<MediaError>().and_then(MediaError::stderr) {
            eprintln!("{}", stderr);
        }
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = commands::load_config(&cli)?;

    match &cli.command {
        Command::Video(job) => commands::run_job(config, JobKind::Video, job).await,
        Command::Image(job) => commands::run_job(config, JobKind::Image, job).await,
        Command::Modes => commands::list_shader_modes(&config).await,
        Command::Selfcheck => commands::selfcheck(config),
    }
}

/// Human-readable logs on stderr by default, JSON with `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Propagate the external tool's exit code when it failed, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<MediaError>() {
        Some(MediaError::ProcessFailed {
            exit_code: Some(code),
            ..
        }) if *code != 0 => *code,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_covers_both_crates() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for target in ["a4k_media=info", "anime4k=info"] {
            assert!(DEFAULT_LOG_FILTER.split(',').any(|d| d == target));
        }
    }

    #[test]
    fn test_exit_code_propagates_tool_status() {
        let err = anyhow::Error::new(MediaError::process_failed("ffmpeg", Some(69), None));
        assert_eq!(exit_code(&err), 69);
    }

    #[test]
    fn test_exit_code_defaults_to_one() {
        let killed = anyhow::Error::new(MediaError::process_failed("mpv", None, None));
        assert_eq!(exit_code(&killed), 1);

        let config = anyhow::Error::new(MediaError::invalid_configuration("bad backend"))
            .context("Invalid --backend");
        assert_eq!(exit_code(&config), 1);
    }
}
