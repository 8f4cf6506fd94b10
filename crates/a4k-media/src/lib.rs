//! FFmpeg/mpv CLI wrapper for Anime4K shader upscaling.
//!
//! This crate provides:
//! - Shader asset lookup by Anime4K mode
//! - Output size resolution from a scale factor or explicit dimensions
//! - Type-safe mpv and FFmpeg command building, including the libplacebo filter graph
//! - A single-attempt process runner with stderr capture and progress parsing
//! - FFprobe media information

pub mod backend;
pub mod command;
pub mod config;
pub mod display;
pub mod error;
pub mod filters;
pub mod probe;
pub mod progress;
pub mod request;
pub mod runner;
pub mod shader;
pub mod upscaler;

pub use backend::Backend;
pub use command::{check_program, FfmpegCommand, Invocation, MpvCommand};
pub use config::UpscalerConfig;
pub use display::{DisplayProbe, EnvDisplayProbe, FixedDisplay};
pub use error::{MediaError, MediaResult};
pub use filters::{build_libplacebo_filter, MediaKind};
pub use probe::{probe_media, probe_media_with, MediaInfo};
pub use progress::FfmpegProgress;
pub use request::{Dimensions, UpscaleRequest};
pub use runner::ProcessRunner;
pub use shader::{default_shader_dir, list_modes, resolve_shader, shader_file_name};
pub use upscaler::Upscaler;
