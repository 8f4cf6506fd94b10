//! FFmpeg and mpv command builders.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};
use crate::request::Dimensions;

/// A fully built external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to spawn
    pub program: PathBuf,
    /// Arguments, passed verbatim (no shell)
    pub args: Vec<String>,
    /// Whether stderr carries `-progress pipe:2` records
    pub reports_progress: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            reports_progress: false,
        }
    }

    /// Run this invocation through a launcher, e.g. `xvfb-run -a <program> <args>`.
    pub fn wrapped_in<I, S>(self, launcher: impl Into<PathBuf>, launcher_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = launcher_args.into_iter().map(Into::into).collect();
        args.push(self.program.to_string_lossy().to_string());
        args.extend(self.args);

        Self {
            program: launcher.into(),
            args,
            reports_progress: self.reports_progress,
        }
    }

    /// Program name for logs and errors.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.to_string_lossy().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Global arguments (before input arguments)
    global_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            global_args: Vec::new(),
            output_args: Vec::new(),
            log_level: "error".to_string(),
        }
    }

    /// Add a global argument.
    pub fn global_arg(mut self, arg: impl Into<String>) -> Self {
        self.global_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Initialise a hardware device, e.g. `vulkan`.
    pub fn init_hw_device(self, device: impl Into<String>) -> Self {
        self.global_arg("-init_hw_device").global_arg(device)
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    ///
    /// `-hide_banner`, `-y` and `-progress pipe:2` are always set.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-y".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];

        args.extend(self.global_args.iter().cloned());

        // Input file
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        // Output args
        args.extend(self.output_args.iter().cloned());

        // Output file
        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Build an invocation of `program` with these arguments.
    pub fn into_invocation(self, program: impl Into<PathBuf>) -> Invocation {
        Invocation {
            program: program.into(),
            args: self.build_args(),
            reports_progress: true,
        }
    }
}

/// Builder for mpv encode commands with GLSL shaders.
#[derive(Debug, Clone)]
pub struct MpvCommand {
    input: PathBuf,
    output: PathBuf,
    shaders: Vec<PathBuf>,
    gpu_size: Option<Dimensions>,
}

impl MpvCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            shaders: Vec::new(),
            gpu_size: None,
        }
    }

    /// Add a GLSL shader.
    pub fn shader(mut self, path: impl AsRef<Path>) -> Self {
        self.shaders.push(path.as_ref().to_path_buf());
        self
    }

    /// Scale on the GPU to the given size with the `gpu` video filter.
    pub fn gpu_scale(mut self, size: Dimensions) -> Self {
        self.gpu_size = Some(size);
        self
    }

    /// Build the command arguments. Subtitles are never rendered.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["--no-sub".to_string()];

        if !self.shaders.is_empty() {
            let shaders: Vec<String> = self
                .shaders
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect();
            args.push(format!("--glsl-shaders={}", shaders.join(SHADER_LIST_SEPARATOR)));
        }

        if let Some(size) = self.gpu_size {
            args.push(format!("-vf=gpu=w={}:h={}", size.width, size.height));
        }

        args.push(format!("-o={}", self.output.to_string_lossy()));
        args.push(self.input.to_string_lossy().to_string());

        args
    }

    pub fn into_invocation(self, program: impl Into<PathBuf>) -> Invocation {
        Invocation::new(program, self.build_args())
    }
}

/// Separator mpv uses between entries of `--glsl-shaders`. It has no escape syntax.
#[cfg(windows)]
pub const SHADER_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const SHADER_LIST_SEPARATOR: &str = ":";

/// Reject shader paths mpv would split into several list entries.
pub fn check_mpv_shader_path(path: &Path) -> MediaResult<()> {
    if path.to_string_lossy().contains(SHADER_LIST_SEPARATOR) {
        return Err(MediaError::invalid_configuration(format!(
            "mpv cannot load a shader whose path contains {:?}: {}",
            SHADER_LIST_SEPARATOR,
            path.display()
        )));
    }
    Ok(())
}

/// Check that a program is available, returning its resolved path.
pub fn check_program(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let program = program.as_ref();
    which::which(program)
        .map_err(|_| MediaError::ProgramNotFound(program.to_string_lossy().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_command_builder() {
        let args = FfmpegCommand::new("/in.mkv", "/out.mkv")
            .init_hw_device("vulkan")
            .video_filter("format=rgba")
            .build_args();

        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-y",
                "-v",
                "error",
                "-progress",
                "pipe:2",
                "-init_hw_device",
                "vulkan",
                "-i",
                "/in.mkv",
                "-vf",
                "format=rgba",
                "/out.mkv",
            ]
        );
    }

    #[test]
    fn test_ffmpeg_log_level() {
        let args = FfmpegCommand::new("a", "b").log_level("warning").build_args();
        let v = args.iter().position(|a| a == "-v").unwrap();
        assert_eq!(args[v + 1], "warning");
    }

    #[test]
    fn test_ffmpeg_invocation_reports_progress() {
        let invocation = FfmpegCommand::new("a", "b").into_invocation("ffmpeg");
        assert!(invocation.reports_progress);
        assert_eq!(invocation.program_name(), "ffmpeg");
    }

    #[test]
    fn test_mpv_command_shape() {
        let args = MpvCommand::new("in.mkv", "out.mkv")
            .shader("/s/Anime4K_ModeA.glsl")
            .gpu_scale(Dimensions::new(2560, 1440))
            .build_args();

        assert_eq!(
            args,
            vec![
                "--no-sub",
                "--glsl-shaders=/s/Anime4K_ModeA.glsl",
                "-vf=gpu=w=2560:h=1440",
                "-o=out.mkv",
                "in.mkv",
            ]
        );
    }

    #[test]
    fn test_wrapped_invocation() {
        let invocation = MpvCommand::new("in.mkv", "out.mkv")
            .into_invocation("mpv")
            .wrapped_in("xvfb-run", ["-a"]);

        assert_eq!(invocation.program, PathBuf::from("xvfb-run"));
        assert_eq!(&invocation.args[..3], &["-a", "mpv", "--no-sub"]);
        assert_eq!(invocation.to_string(), "xvfb-run -a mpv --no-sub -o=out.mkv in.mkv");
    }

    #[test]
    fn test_mpv_shader_path_with_separator_rejected() {
        let bad = PathBuf::from(format!("/opt/a{SHADER_LIST_SEPARATOR}b/Anime4K_ModeA.glsl"));
        let err = check_mpv_shader_path(&bad).unwrap_err();
        assert!(matches!(err, MediaError::InvalidConfiguration(_)));

        check_mpv_shader_path(Path::new("/opt/anime4k/Anime4K_ModeA.glsl")).unwrap();
    }

    #[test]
    fn test_check_program_missing() {
        let err = check_program("definitely-not-a-real-program-a4k").unwrap_err();
        assert!(matches!(err, MediaError::ProgramNotFound(_)));
    }
}
