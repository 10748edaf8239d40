// src/config.rs

//! Defines the configuration structures for `rgba-view`.
//!
//! Every section carries `#[serde(default)]`, so a configuration file only
//! needs to name the settings it changes. The file is JSON and is located
//! through the `RGBA_VIEW_CONFIG` environment variable; without it the
//! defaults reproduce the classic 800x600 teal window.

use crate::display::EventMask;
use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "RGBA_VIEW_CONFIG";

/// Process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub source: SourceConfig,
    pub event_loop: EventLoopConfig,
}

/// Settings for the native window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Window size used when the pixel source produces an empty image.
    pub default_width: u32,
    pub default_height: u32,
    pub position_x: i32,
    pub position_y: i32,
    /// RGB shown where the framebuffer does not cover the window.
    pub background: [u8; 3],
    /// X11 display name. `None` defers to `$DISPLAY`.
    pub display: Option<String>,
    /// Event classes registered at open time. Close is always added.
    pub events: EventMask,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "rgba-view".to_string(),
            default_width: 800,
            default_height: 600,
            position_x: 100,
            position_y: 100,
            background: [0, 0, 0],
            display: None,
            events: EventMask::default(),
        }
    }
}

impl WindowConfig {
    /// Background as an opaque RGBA pixel.
    pub fn background_rgba(&self) -> [u8; 4] {
        let [r, g, b] = self.background;
        [r, g, b, 255]
    }

    /// Background packed as `0x00RRGGBB`.
    pub fn background_rgb24(&self) -> u32 {
        let [r, g, b] = self.background;
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Solid,
    Gradient,
    /// A PNG, decoded at its own size.
    Image,
}

/// What the pixel source draws.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub width: u32,
    pub height: u32,
    /// RGBA fill for [`SourceKind::Solid`].
    pub color: [u8; 4],
    /// PNG file for [`SourceKind::Image`]. `None` shows the embedded image.
    pub path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Solid,
            width: 800,
            height: 600,
            color: [50, 200, 200, 255],
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventLoopConfig {
    /// Sleep between drains that returned no events.
    pub tick_interval_ms: u64,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
        }
    }
}

impl EventLoopConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Config {
    /// Loads the file named by `RGBA_VIEW_CONFIG`, falling back to defaults.
    ///
    /// A missing variable is normal. An unreadable or malformed file is logged
    /// and ignored so the window still comes up.
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        match Self::from_file(Path::new(&path)) {
            Ok(config) => {
                info!("Loaded configuration from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                warn!("Ignoring configuration: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_window() {
        let config = Config::default();
        assert_eq!(config.source.width, 800);
        assert_eq!(config.source.height, 600);
        assert_eq!(config.source.color, [50, 200, 200, 255]);
        assert_eq!(config.window.events, EventMask::all());
        assert_eq!(config.event_loop.tick(), Duration::from_millis(10));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_json(
            r#"{ "window": { "title": "demo", "background": [1, 2, 3] },
                 "source": { "kind": "gradient" } }"#,
        )
        .unwrap();
        assert_eq!(config.window.title, "demo");
        assert_eq!(config.window.background_rgb24(), 0x010203);
        assert_eq!(config.window.background_rgba(), [1, 2, 3, 255]);
        assert_eq!(config.window.default_width, 800);
        assert_eq!(config.source.kind, SourceKind::Gradient);
        assert_eq!(config.source.color, [50, 200, 200, 255]);
    }

    #[test]
    fn image_source_reads_an_optional_path() {
        let config = Config::from_json(r#"{ "source": { "kind": "image" } }"#).unwrap();
        assert_eq!(config.source.kind, SourceKind::Image);
        assert_eq!(config.source.path, None);

        let config =
            Config::from_json(r#"{ "source": { "kind": "image", "path": "/tmp/a.png" } }"#)
                .unwrap();
        assert_eq!(config.source.path, Some(PathBuf::from("/tmp/a.png")));
    }

    #[test]
    fn event_mask_is_read_from_flag_names() {
        let config = Config::from_json(r#"{ "window": { "events": "EXPOSE | KEY" } }"#).unwrap();
        assert_eq!(config.window.events, EventMask::EXPOSE | EventMask::KEY);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::from_json("{ window: ").is_err());
        assert!(Config::from_file(Path::new("/nonexistent/rgba-view.json")).is_err());
    }
}
