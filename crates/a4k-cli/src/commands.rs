//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use a4k_media::{
    check_program, default_shader_dir, list_modes, probe_media_with, Backend, DisplayProbe,
    EnvDisplayProbe, FfmpegProgress, MediaInfo, UpscaleRequest, Upscaler, UpscalerConfig,
};

use crate::cli::{Cli, JobArgs};

/// Merge environment configuration with command-line overrides.
pub fn load_config(cli: &Cli) -> Result<UpscalerConfig> {
    let mut config = UpscalerConfig::from_env().context("Invalid environment configuration")?;

    if let Some(backend) = &cli.backend {
        config.backend = backend.parse().context("Invalid --backend")?;
    }
    if let Some(mode) = &cli.mode {
        config.mode = mode.clone();
    }
    if let Some(dir) = &cli.shader_dir {
        config.shader_dir = Some(dir.clone());
    }

    Ok(config)
}

/// Which operation a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Video,
    Image,
}

/// Run a video or image job.
pub async fn run_job(config: UpscalerConfig, kind: JobKind, job: &JobArgs) -> Result<()> {
    let upscaler = Upscaler::new(config).context("Failed to configure upscaler")?;

    let probed = if needs_probe(job) {
        let ffprobe = &upscaler.config().ffprobe_program;
        Some(
            probe_media_with(&job.input, ffprobe)
                .await
                .with_context(|| format!("Failed to probe {}", job.input.display()))?,
        )
    } else {
        None
    };

    let request = build_request(job, probed.as_ref())?;

    let size = match kind {
        JobKind::Video => {
            let duration_ms = probed.as_ref().map(MediaInfo::duration_ms).unwrap_or(0);
            upscaler
                .process_video_with_progress(&request, move |progress| {
                    log_progress(&progress, duration_ms)
                })
                .await?
        }
        JobKind::Image => upscaler.process_image(&request).await?,
    };

    info!("Wrote {} ({})", request.output.display(), size);
    Ok(())
}

/// Input dimensions only matter for a scale factor; explicit output sizes never probe.
fn needs_probe(job: &JobArgs) -> bool {
    job.scale.is_some() && (job.input_width.is_none() || job.input_height.is_none())
}

fn build_request(job: &JobArgs, probed: Option<&MediaInfo>) -> Result<UpscaleRequest> {
    let (input_width, input_height) = match (job.input_width, job.input_height, probed) {
        (Some(w), Some(h), _) => (w, h),
        (_, _, Some(info)) => (info.width, info.height),
        // Unused without a scale factor
        _ if job.scale.is_none() => (0, 0),
        _ => bail!("input dimensions are unknown; pass --input-width and --input-height"),
    };

    let mut request = UpscaleRequest::new(&job.input, &job.output, input_width, input_height);
    request.scale = job.scale;
    request.output_width = job.width;
    request.output_height = job.height;
    Ok(request)
}

fn log_progress(progress: &FfmpegProgress, duration_ms: i64) {
    if duration_ms > 0 {
        info!(
            frame = progress.frame,
            speed = progress.speed,
            "Progress {:.1}%",
            progress.percentage(duration_ms)
        );
    } else {
        info!(frame = progress.frame, speed = progress.speed, "Progress");
    }
}

/// Print the modes available in the shader directory.
pub async fn list_shader_modes(config: &UpscalerConfig) -> Result<()> {
    let dir = match &config.shader_dir {
        Some(dir) => dir.clone(),
        None => default_shader_dir()?,
    };

    let modes = list_modes(&dir)
        .await
        .with_context(|| format!("Failed to read shader directory {}", dir.display()))?;

    if modes.is_empty() {
        println!("No Anime4K shaders found in {}", dir.display());
        return Ok(());
    }

    for mode in modes {
        let marker = if mode == config.mode { "*" } else { " " };
        println!("{} {}", marker, mode);
    }
    Ok(())
}

/// Verify that the shader and the external tools for the configured backend are present.
pub fn selfcheck(config: UpscalerConfig) -> Result<()> {
    println!("selfcheck: backend={} mode={}", config.backend, config.mode);

    let ffmpeg = check_program(&config.ffmpeg_program)
        .context("ffmpeg is required for image jobs and the ffmpeg backend")?;
    println!("selfcheck: ffmpeg at {}", ffmpeg.display());

    if config.backend == Backend::Mpv {
        let mpv = check_program(&config.mpv_program)?;
        println!("selfcheck: mpv at {}", mpv.display());

        if !EnvDisplayProbe.has_display() {
            let xvfb = check_program(&config.xvfb_run_program)
                .context("no DISPLAY set and xvfb-run is unavailable")?;
            println!("selfcheck: headless, xvfb-run at {}", xvfb.display());
        }
    }

    if check_program(&config.ffprobe_program).is_err() {
        warn!("ffprobe not found; --scale jobs will need --input-width/--input-height");
    }

    let upscaler = Upscaler::new(config)?;
    println!("selfcheck: shader {}", upscaler.shader_path().display());

    println!("selfcheck: ok");
    Ok(())
}
