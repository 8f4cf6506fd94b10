//! Upscaler configuration.

use std::path::PathBuf;

use crate::backend::Backend;
use crate::error::MediaResult;

/// Default Anime4K mode.
pub const DEFAULT_MODE: &str = "A";

/// Default ffmpeg log level; only errors reach the captured stderr.
pub const DEFAULT_FFMPEG_LOG_LEVEL: &str = "error";

/// Upscaler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscalerConfig {
    /// External tool family
    pub backend: Backend,
    /// Anime4K mode, selects `Anime4K_Mode<mode>.glsl`
    pub mode: String,
    /// Shader directory override (defaults to `shaders/` next to the executable)
    pub shader_dir: Option<PathBuf>,
    /// ffmpeg executable
    pub ffmpeg_program: PathBuf,
    /// mpv executable
    pub mpv_program: PathBuf,
    /// Virtual display launcher used when no display is available
    pub xvfb_run_program: PathBuf,
    /// ffprobe executable, used when input dimensions must be read from the file
    pub ffprobe_program: PathBuf,
    /// Value passed to ffmpeg's `-v`
    pub ffmpeg_log_level: String,
}

impl Default for UpscalerConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            mode: DEFAULT_MODE.to_string(),
            shader_dir: None,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            mpv_program: PathBuf::from("mpv"),
            xvfb_run_program: PathBuf::from("xvfb-run"),
            ffprobe_program: PathBuf::from("ffprobe"),
            ffmpeg_log_level: DEFAULT_FFMPEG_LOG_LEVEL.to_string(),
        }
    }
}

impl UpscalerConfig {
    /// Create a config for a backend and mode with default tool paths.
    pub fn new(backend: Backend, mode: impl Into<String>) -> Self {
        Self {
            backend,
            mode: mode.into(),
            ..Self::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// Fails with [`MediaError::InvalidConfiguration`](crate::MediaError::InvalidConfiguration)
    /// when `ANIME4K_BACKEND` names an unsupported backend.
    pub fn from_env() -> MediaResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> MediaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match non_empty("ANIME4K_BACKEND") {
            Some(name) => name.parse()?,
            None => defaults.backend,
        };

        Ok(Self {
            backend,
            mode: non_empty("ANIME4K_MODE").unwrap_or(defaults.mode),
            shader_dir: non_empty("ANIME4K_SHADER_DIR").map(PathBuf::from),
            ffmpeg_program: non_empty("ANIME4K_FFMPEG")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_program),
            mpv_program: non_empty("ANIME4K_MPV")
                .map(PathBuf::from)
                .unwrap_or(defaults.mpv_program),
            xvfb_run_program: non_empty("ANIME4K_XVFB_RUN")
                .map(PathBuf::from)
                .unwrap_or(defaults.xvfb_run_program),
            ffprobe_program: non_empty("ANIME4K_FFPROBE")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_program),
            ffmpeg_log_level: non_empty("ANIME4K_FFMPEG_LOG_LEVEL")
                .unwrap_or(defaults.ffmpeg_log_level),
        })
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the mode.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the shader directory.
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }
}
