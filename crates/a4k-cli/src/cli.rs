//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Upscale anime video and images with Anime4K GLSL shaders via mpv or ffmpeg.
#[derive(Debug, Parser)]
#[command(name = "anime4k", version, about, long_about = None)]
pub struct Cli {
    /// External tool to run: mpv or ffmpeg [env: ANIME4K_BACKEND, default: mpv]
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Anime4K mode, selects shaders/Anime4K_Mode<MODE>.glsl [env: ANIME4K_MODE, default: A]
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// Directory holding the Anime4K_Mode*.glsl shaders [env: ANIME4K_SHADER_DIR]
    #[arg(long, global = true)]
    pub shader_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upscale a video file
    Video(JobArgs),
    /// Upscale an image file (always uses ffmpeg)
    Image(JobArgs),
    /// List the modes available in the shader directory
    Modes,
    /// Check that the configured tools and shader are available
    Selfcheck,
}

#[derive(Debug, Clone, Args)]
pub struct JobArgs {
    /// Input file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (overwritten if it exists)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Integer scale factor; takes precedence over --width/--height
    #[arg(short, long)]
    pub scale: Option<u32>,

    /// Output width in pixels
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Input width in pixels (probed with ffprobe [env: ANIME4K_FFPROBE] when scaling without it)
    #[arg(long, requires = "input_height")]
    pub input_width: Option<u32>,

    /// Input height in pixels (probed with ffprobe when scaling without it)
    #[arg(long, requires = "input_width")]
    pub input_height: Option<u32>,
}
