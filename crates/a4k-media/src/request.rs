//! Upscale job requests and output size resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single video or image upscale job.
///
/// Exactly one sizing mode is expected: a `scale` factor, or both `output_width` and
/// `output_height`. When both are present the scale factor wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaleRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_width: u32,
    pub input_height: u32,
    pub scale: Option<u32>,
    pub output_width: Option<u32>,
    pub output_height: Option<u32>,
}

impl UpscaleRequest {
    /// Create a request without any sizing mode set.
    pub fn new(
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        input_width: u32,
        input_height: u32,
    ) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_width,
            input_height,
            scale: None,
            output_width: None,
            output_height: None,
        }
    }

    /// Scale both axes by an integer factor.
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Request explicit output dimensions.
    pub fn output_size(mut self, width: u32, height: u32) -> Self {
        self.output_width = Some(width);
        self.output_height = Some(height);
        self
    }

    /// Input dimensions.
    pub fn input_dimensions(&self) -> Dimensions {
        Dimensions::new(self.input_width, self.input_height)
    }

    /// Compute the target dimensions.
    ///
    /// Fails with [`MediaError::InvalidArgument`] when neither a scale nor both output
    /// dimensions are given, when any value is zero, or when scaling overflows.
    pub fn output_dimensions(&self) -> MediaResult<Dimensions> {
        if let Some(scale) = self.scale {
            if self.output_width.is_some() || self.output_height.is_some() {
                warn!(
                    scale,
                    output_width = ?self.output_width,
                    output_height = ?self.output_height,
                    "Both scale and output dimensions given, output dimensions ignored"
                );
            }
            return scale_dimensions(self.input_dimensions(), scale);
        }

        match (self.output_width, self.output_height) {
            (Some(width), Some(height)) => {
                if width == 0 || height == 0 {
                    return Err(MediaError::invalid_argument(format!(
                        "output dimensions must be positive, got {}x{}",
                        width, height
                    )));
                }
                Ok(Dimensions::new(width, height))
            }
            _ => Err(MediaError::invalid_argument(
                "either scale or both output_width and output_height must be provided",
            )),
        }
    }
}

/// Multiply both axes by `scale`.
pub fn scale_dimensions(input: Dimensions, scale: u32) -> MediaResult<Dimensions> {
    if scale == 0 {
        return Err(MediaError::invalid_argument("scale must be positive"));
    }
    if input.width == 0 || input.height == 0 {
        return Err(MediaError::invalid_argument(format!(
            "input dimensions must be positive, got {}",
            input
        )));
    }

    match (input.width.checked_mul(scale), input.height.checked_mul(scale)) {
        (Some(width), Some(height)) => Ok(Dimensions::new(width, height)),
        _ => Err(MediaError::invalid_argument(format!(
            "scaling {} by {} overflows",
            input, scale
        ))),
    }
}
