//! Anime4K upscaler invoker.
//!
//! Resolves the shader for a mode once at construction, then turns each [`UpscaleRequest`] into a
//! single `mpv` or `ffmpeg` invocation and waits for it to exit.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::command::{check_mpv_shader_path, FfmpegCommand, Invocation, MpvCommand};
use crate::config::UpscalerConfig;
use crate::display::{DisplayProbe, EnvDisplayProbe};
use crate::error::MediaResult;
use crate::filters::{build_libplacebo_filter, MediaKind};
use crate::progress::FfmpegProgress;
use crate::request::{Dimensions, UpscaleRequest};
use crate::runner::ProcessRunner;
use crate::shader::{default_shader_dir, resolve_shader};

/// Hardware device initialised for libplacebo.
pub const HW_DEVICE: &str = "vulkan";

/// Arguments passed to `xvfb-run` ahead of the wrapped command.
pub const XVFB_RUN_ARGS: &[&str] = &["-a"];

/// Configured upscaler bound to one backend and one shader.
pub struct Upscaler {
    config: UpscalerConfig,
    shader_path: PathBuf,
    display: Box<dyn DisplayProbe>,
    runner: ProcessRunner,
}

impl fmt::Debug for Upscaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upscaler")
            .field("config", &self.config)
            .field("shader_path", &self.shader_path)
            .finish_non_exhaustive()
    }
}

impl Upscaler {
    /// Create an upscaler, resolving the shader for `config.mode`.
    ///
    /// Fails with `ShaderNotFound` when the shader file is missing.
    pub fn new(config: UpscalerConfig) -> MediaResult<Self> {
        let shader_dir = match &config.shader_dir {
            Some(dir) => dir.clone(),
            None => default_shader_dir()?,
        };
        let shader_path = resolve_shader(&shader_dir, &config.mode)?;

        debug!(
            backend = %config.backend,
            mode = %config.mode,
            shader = %shader_path.display(),
            "Upscaler configured"
        );

        Ok(Self {
            config,
            shader_path,
            display: Box::new(EnvDisplayProbe),
            runner: ProcessRunner::new(),
        })
    }

    /// Create an upscaler from a backend name and mode, using the default shader directory.
    ///
    /// Fails with `InvalidConfiguration` for backends other than `mpv` and `ffmpeg`.
    pub fn from_names(backend: &str, mode: &str) -> MediaResult<Self> {
        let backend: Backend = backend.parse()?;
        Self::new(UpscalerConfig::new(backend, mode))
    }

    /// Replace the display detection used for the mpv backend.
    pub fn with_display_probe(mut self, probe: impl DisplayProbe + 'static) -> Self {
        self.display = Box::new(probe);
        self
    }

    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    pub fn mode(&self) -> &str {
        &self.config.mode
    }

    /// Absolute path of the resolved shader.
    pub fn shader_path(&self) -> &Path {
        &self.shader_path
    }

    pub fn config(&self) -> &UpscalerConfig {
        &self.config
    }

    /// Build the invocation for a video job on the configured backend.
    pub fn build_video_invocation(&self, request: &UpscaleRequest) -> MediaResult<Invocation> {
        let size = request.output_dimensions()?;
        self.video_invocation(request, size)
    }

    /// Build the invocation for an image job.
    ///
    /// Images always go through ffmpeg; mpv cannot encode a still image to a file.
    pub fn build_image_invocation(&self, request: &UpscaleRequest) -> MediaResult<Invocation> {
        let size = request.output_dimensions()?;
        self.image_invocation(request, size)
    }

    /// Upscale a video, returning the output dimensions.
    pub async fn process_video(&self, request: &UpscaleRequest) -> MediaResult<Dimensions> {
        self.process_video_with_progress(request, |_| {}).await
    }

    /// Upscale a video with an ffmpeg progress callback (never called for mpv).
    pub async fn process_video_with_progress<F>(
        &self,
        request: &UpscaleRequest,
        progress_callback: F,
    ) -> MediaResult<Dimensions>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let size = request.output_dimensions()?;
        let invocation = self.video_invocation(request, size)?;
        self.execute(request, size, invocation, progress_callback).await
    }

    /// Upscale an image, returning the output dimensions.
    pub async fn process_image(&self, request: &UpscaleRequest) -> MediaResult<Dimensions> {
        let size = request.output_dimensions()?;
        let invocation = self.image_invocation(request, size)?;
        self.execute(request, size, invocation, |_| {}).await
    }

    async fn execute<F>(
        &self,
        request: &UpscaleRequest,
        size: Dimensions,
        invocation: Invocation,
        progress_callback: F,
    ) -> MediaResult<Dimensions>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        info!(
            input = %request.input.display(),
            output = %request.output.display(),
            from = %request.input_dimensions(),
            to = %size,
            mode = %self.config.mode,
            "Upscaling with {}",
            invocation.program_name()
        );

        self.runner
            .run_with_progress(&invocation, progress_callback)
            .await?;
        Ok(size)
    }

    fn video_invocation(
        &self,
        request: &UpscaleRequest,
        size: Dimensions,
    ) -> MediaResult<Invocation> {
        match self.config.backend {
            Backend::Mpv => self.mpv_invocation(request, size),
            Backend::Ffmpeg => self.ffmpeg_invocation(request, size, MediaKind::Video),
        }
    }

    fn image_invocation(
        &self,
        request: &UpscaleRequest,
        size: Dimensions,
    ) -> MediaResult<Invocation> {
        if self.config.backend == Backend::Mpv {
            debug!("Image jobs use the ffmpeg backend");
        }
        self.ffmpeg_invocation(request, size, MediaKind::Image)
    }

    fn mpv_invocation(
        &self,
        request: &UpscaleRequest,
        size: Dimensions,
    ) -> MediaResult<Invocation> {
        check_mpv_shader_path(&self.shader_path)?;

        let invocation = MpvCommand::new(&request.input, &request.output)
            .shader(&self.shader_path)
            .gpu_scale(size)
            .into_invocation(&self.config.mpv_program);

        if self.display.has_display() {
            Ok(invocation)
        } else {
            debug!("No display available, running mpv under xvfb-run");
            Ok(invocation.wrapped_in(&self.config.xvfb_run_program, XVFB_RUN_ARGS.iter().copied()))
        }
    }

    fn ffmpeg_invocation(
        &self,
        request: &UpscaleRequest,
        size: Dimensions,
        kind: MediaKind,
    ) -> MediaResult<Invocation> {
        let input = std::path::absolute(&request.input)?;
        let output = std::path::absolute(&request.output)?;
        let filter = build_libplacebo_filter(kind, size, &self.shader_path);

        Ok(FfmpegCommand::new(input, output)
            .init_hw_device(HW_DEVICE)
            .video_filter(filter)
            .log_level(&self.config.ffmpeg_log_level)
            .into_invocation(&self.config.ffmpeg_program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::FixedDisplay;
    use crate::error::MediaError;
    use tempfile::TempDir;

    fn shader_dir(modes: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for mode in modes {
            let shader = dir.path().join(format!("Anime4K_Mode{mode}.glsl"));
            std::fs::write(shader, "//!HOOK MAIN").unwrap();
        }
        dir
    }

    fn upscaler(dir: &TempDir, backend: Backend) -> Upscaler {
        Upscaler::new(UpscalerConfig::new(backend, "A").with_shader_dir(dir.path()))
            .unwrap()
            .with_display_probe(FixedDisplay(true))
    }

    #[test]
    fn test_missing_shader_fails_construction() {
        let dir = shader_dir(&["A"]);
        let err = Upscaler::new(UpscalerConfig::new(Backend::Mpv, "Z").with_shader_dir(dir.path()))
            .unwrap_err();
        assert!(matches!(err, MediaError::ShaderNotFound(_)));
    }

    #[test]
    fn test_unknown_backend_name() {
        let err = Upscaler::from_names("handbrake", "A").unwrap_err();
        assert!(matches!(err, MediaError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_mpv_video_invocation() {
        let dir = shader_dir(&["A"]);
        let upscaler = upscaler(&dir, Backend::Mpv);
        let request = UpscaleRequest::new("in.mkv", "out.mkv", 1280, 720).scale(2);

        let invocation = upscaler.build_video_invocation(&request).unwrap();
        let shader = upscaler.shader_path().to_string_lossy().to_string();

        assert_eq!(invocation.program, PathBuf::from("mpv"));
        assert_eq!(
            invocation.args,
            vec![
                "--no-sub".to_string(),
                format!("--glsl-shaders={shader}"),
                "-vf=gpu=w=2560:h=1440".to_string(),
                "-o=out.mkv".to_string(),
                "in.mkv".to_string(),
            ]
        );
    }

    #[test]
    fn test_mpv_headless_uses_xvfb() {
        let dir = shader_dir(&["A"]);
        let upscaler = upscaler(&dir, Backend::Mpv).with_display_probe(FixedDisplay(false));
        let request = UpscaleRequest::new("in.mkv", "out.mkv", 1280, 720).scale(2);

        let argv = upscaler.build_video_invocation(&request).unwrap().argv();
        assert_eq!(&argv[..4], &["xvfb-run", "-a", "mpv", "--no-sub"]);
    }

    #[test]
    fn test_ffmpeg_video_invocation() {
        let dir = shader_dir(&["A"]);
        let upscaler = upscaler(&dir, Backend::Ffmpeg);
        let request = UpscaleRequest::new("in.mkv", "out.mkv", 640, 480).output_size(1920, 1080);

        let invocation = upscaler.build_video_invocation(&request).unwrap();
        let args = &invocation.args;

        assert_eq!(invocation.program, PathBuf::from("ffmpeg"));
        assert!(args.contains(&"-hide_banner".to_string()));
        assert!(args.contains(&"-y".to_string()));
        let hw = args.iter().position(|a| a == "-init_hw_device").unwrap();
        assert_eq!(args[hw + 1], "vulkan");

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        let filter = &args[vf + 1];
        assert!(filter.starts_with("format=yuv420p10,hwupload,libplacebo=w=1920:h=1080:"));
        assert!(filter.ends_with(",hwdownload,format=yuv420p10"));

        // Paths are made absolute
        let input = &args[args.iter().position(|a| a == "-i").unwrap() + 1];
        assert!(Path::new(input).is_absolute());
        assert!(Path::new(args.last().unwrap()).is_absolute());
    }

    #[test]
    fn test_image_invocation_uses_ffmpeg_and_rgba() {
        let dir = shader_dir(&["A"]);
        for backend in Backend::ALL {
            let upscaler = upscaler(&dir, *backend);
            let request = UpscaleRequest::new("in.png", "out.png", 640, 480).scale(3);

            let invocation = upscaler.build_image_invocation(&request).unwrap();
            assert_eq!(invocation.program, PathBuf::from("ffmpeg"));

            let vf = invocation.args.iter().position(|a| a == "-vf").unwrap();
            let filter = &invocation.args[vf + 1];
            assert!(filter.starts_with("format=rgba,"));
            assert!(filter.contains("w=1920:h=1440"));
        }
    }

    #[test]
    fn test_missing_sizing_is_invalid_argument() {
        let dir = shader_dir(&["A"]);
        let upscaler = upscaler(&dir, Backend::Ffmpeg);
        let request = UpscaleRequest::new("in.mkv", "out.mkv", 640, 480);

        assert!(matches!(
            upscaler.build_video_invocation(&request),
            Err(MediaError::InvalidArgument(_))
        ));
        assert!(matches!(
            upscaler.build_image_invocation(&request),
            Err(MediaError::InvalidArgument(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_mpv_rejects_shader_dir_with_list_separator() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("anime4k:v4");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("Anime4K_ModeA.glsl"), "//!HOOK MAIN").unwrap();
        let request = UpscaleRequest::new("in.mkv", "out.mkv", 1280, 720).scale(2);

        let mpv = Upscaler::new(UpscalerConfig::new(Backend::Mpv, "A").with_shader_dir(&dir))
            .unwrap()
            .with_display_probe(FixedDisplay(true));
        assert!(matches!(
            mpv.build_video_invocation(&request),
            Err(MediaError::InvalidConfiguration(_))
        ));

        // ffmpeg escapes the path inside the filter graph
        let ffmpeg = Upscaler::new(UpscalerConfig::new(Backend::Ffmpeg, "A").with_shader_dir(&dir))
            .unwrap();
        assert!(ffmpeg.build_video_invocation(&request).is_ok());
    }
}
