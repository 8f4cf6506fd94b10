//! External tool backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MediaError;

/// External executable family that performs the actual processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Real-time media player (`mpv`) with `--glsl-shaders`
    #[default]
    Mpv,
    /// Batch transcoder (`ffmpeg`) with the libplacebo filter
    Ffmpeg,
}

impl Backend {
    /// All supported backends.
    pub const ALL: &'static [Backend] = &[Backend::Mpv, Backend::Ffmpeg];

    /// Backend name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Mpv => "mpv",
            Backend::Ffmpeg => "ffmpeg",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mpv" => Ok(Backend::Mpv),
            "ffmpeg" => Ok(Backend::Ffmpeg),
            _ => Err(MediaError::invalid_configuration(format!(
                "backend must be either mpv or ffmpeg, got {:?}",
                s
            ))),
        }
    }
}
