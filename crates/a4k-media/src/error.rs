//! Error types for upscaling operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for upscaling operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while configuring or running an upscale.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Shader not found: {}", .0.display())]
    ShaderNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found in PATH")]
    ProgramNotFound(String),

    #[error("{program} exited with {}", exit_code_label(.exit_code))]
    ProcessFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    #[error("FFprobe command failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl MediaError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an external process failure error.
    pub fn process_failed(
        program: impl Into<String>,
        exit_code: Option<i32>,
        stderr: Option<String>,
    ) -> Self {
        Self::ProcessFailed {
            program: program.into(),
            exit_code,
            stderr,
        }
    }

    /// Exit code of the failed external process, if this is a process failure.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Captured stderr of the failed external process, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { stderr, .. } | Self::ProbeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_display() {
        let err = MediaError::process_failed("ffmpeg", Some(1), Some("boom".to_string()));
        assert_eq!(err.to_string(), "ffmpeg exited with exit code 1");
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.stderr(), Some("boom"));

        let killed = MediaError::process_failed("mpv", None, None);
        assert!(killed.to_string().contains("terminated by signal"));
        assert_eq!(killed.exit_code(), None);
    }

    #[test]
    fn test_exit_code_only_for_process_failures() {
        let err = MediaError::invalid_argument("no scale");
        assert_eq!(err.exit_code(), None);
        assert!(err.stderr().is_none());
    }
}
