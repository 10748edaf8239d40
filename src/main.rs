// src/main.rs

use anyhow::Context;
use log::info;
use rgba_view::config::CONFIG;
use rgba_view::display::{DisplayManager, NativeBackend};
use rgba_view::{app, source};

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting rgba-view...");

    let config = &*CONFIG;
    let mut source = source::from_config(&config.source);
    let mut backend: NativeBackend = DisplayManager::new(config.window.clone());

    app::run(&mut backend, &mut source, config).context("rgba-view failed")?;

    info!("rgba-view exited cleanly.");
    Ok(())
}
