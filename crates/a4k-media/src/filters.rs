//! FFmpeg filter graph definitions.

use std::path::Path;

use crate::request::Dimensions;

/// libplacebo scaler used for the non-shader part of the resize.
pub const LIBPLACEBO_UPSCALER: &str = "ewa_lanczos";

/// Pixel format for video output (10-bit YUV 4:2:0 planar).
pub const VIDEO_PIXEL_FORMAT: &str = "yuv420p10";

/// Pixel format for image output.
pub const IMAGE_PIXEL_FORMAT: &str = "rgba";

/// Kind of media being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Pixel format used on both ends of the GPU round trip.
    pub fn pixel_format(&self) -> &'static str {
        match self {
            MediaKind::Video => VIDEO_PIXEL_FORMAT,
            MediaKind::Image => IMAGE_PIXEL_FORMAT,
        }
    }
}

/// Build the libplacebo upscale filter graph.
///
/// `format -> hwupload -> libplacebo (custom shader) -> hwdownload -> format`
pub fn build_libplacebo_filter(kind: MediaKind, size: Dimensions, shader: &Path) -> String {
    let pix_fmt = kind.pixel_format();
    let shader = escape_graph(&escape_option_value(&shader.to_string_lossy()));

    format!(
        "format={pix_fmt},hwupload,\
         libplacebo=w={w}:h={h}:upscaler={upscaler}:custom_shader_path={shader},\
         hwdownload,format={pix_fmt}",
        w = size.width,
        h = size.height,
        upscaler = LIBPLACEBO_UPSCALER,
    )
}

/// Escape a filter option value (`\`, `'` and `:`).
pub fn escape_option_value(value: &str) -> String {
    escape_chars(value, &['\\', '\'', ':'])
}

/// Escape text for the filter graph parser (`\`, `'`, `[`, `]`, `,` and `;`).
pub fn escape_graph(value: &str) -> String {
    escape_chars(value, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
