//! Application driver: pixel source to window, then the event loop.

use crate::config::Config;
use crate::display::WindowBackend;
use crate::source::PixelSource;
use anyhow::{Context, Result};
use log::{debug, error, info};

/// Shows one framebuffer from `source` in `backend` until the window closes.
///
/// Fails when the source cannot produce a framebuffer, when the window cannot
/// be opened (including an unreachable window system or a backend that was
/// already closed) and when the event loop hits a fatal error. A rejected
/// framebuffer is logged and the window still shows its background.
pub fn run<B, S>(backend: &mut B, source: &mut S, config: &Config) -> Result<()>
where
    B: WindowBackend + ?Sized,
    S: PixelSource + ?Sized,
{
    let framebuffer = source
        .initial_framebuffer()
        .context("Failed to produce the initial framebuffer")?;
    let (width, height) = if framebuffer.is_empty() {
        (config.window.default_width, config.window.default_height)
    } else {
        framebuffer.size()
    };

    let state = backend
        .open(&config.window.title, width, height)
        .context("Failed to open window")?;
    info!("Window {:?} open at {}x{}", state.handle, width, height);

    if let Err(e) = backend.set_framebuffer(framebuffer) {
        if e.is_fatal() {
            return Err(e).context("Failed to hand over framebuffer");
        }
        error!("Framebuffer rejected, showing background only: {}", e);
    }

    backend
        .run_loop(config.event_loop.tick())
        .context("Event loop failed")?;

    if let Err(e) = backend.close() {
        debug!("Close after loop: {}", e);
    }
    info!("Window closed, exiting");
    Ok(())
}
