//! Display availability detection.
//!
//! mpv needs an X display even when rendering to a file; on headless hosts the invocation is
//! wrapped in `xvfb-run`.

/// Reports whether a display is available to the external player.
pub trait DisplayProbe: Send + Sync {
    fn has_display(&self) -> bool;
}

/// Checks the `DISPLAY` environment variable of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvDisplayProbe;

impl DisplayProbe for EnvDisplayProbe {
    fn has_display(&self) -> bool {
        std::env::var_os("DISPLAY").is_some_and(|v| !v.is_empty())
    }
}

/// Fixed answer, for callers that already know.
#[derive(Debug, Clone, Copy)]
pub struct FixedDisplay(pub bool);

impl DisplayProbe for FixedDisplay {
    fn has_display(&self) -> bool {
        self.0
    }
}
