//! Full application runs against the headless driver.

use anyhow::Result;
use rgba_view::app;
use rgba_view::config::{Config, SourceConfig, SourceKind, WindowConfig};
use rgba_view::display::{
    BlitRegion, DisplayManager, Event, HeadlessDisplayDriver, HeadlessOp, Lifecycle,
    WindowBackend,
};
use rgba_view::source::{self, PixelSource, PngImage, SolidFill};
use rgba_view::{DisplayError, Framebuffer};
use test_log::test;

/// A headless backend whose window system will deliver `events` once opened.
fn scripted(events: Vec<Event>) -> DisplayManager<HeadlessDisplayDriver> {
    DisplayManager::with_connector(WindowConfig::default(), move |config: &WindowConfig| {
        let mut driver = HeadlessDisplayDriver::new(config);
        for event in events {
            driver.push_event(event);
        }
        Ok(driver)
    })
}

fn presented(backend: &DisplayManager<HeadlessDisplayDriver>) -> Vec<BlitRegion> {
    backend
        .driver()
        .unwrap()
        .ops()
        .iter()
        .filter_map(|op| match op {
            HeadlessOp::Presented(region) => Some(*region),
            _ => None,
        })
        .collect()
}

#[test]
fn default_run_paints_800x600_teal_byte_for_byte() {
    let config = Config::default();
    let mut source = source::from_config(&config.source);
    let expected = source.initial_framebuffer().unwrap();
    let mut backend = scripted(vec![Event::Expose, Event::Close]);

    app::run(&mut backend, &mut source, &config).unwrap();

    assert_eq!(backend.lifecycle(), Lifecycle::Closed);
    let driver = backend.driver().unwrap();
    assert_eq!(driver.size(), (800, 600));
    assert_eq!(driver.surface(), expected.pixels());
    assert_eq!(
        presented(&backend),
        vec![BlitRegion {
            width: 800,
            height: 600
        }]
    );
}

#[test]
fn resize_then_expose_paints_only_the_visible_part() {
    let config = Config::default();
    let mut source = SolidFill {
        width: 800,
        height: 600,
        rgba: [50, 200, 200, 255],
    };
    let mut backend = scripted(vec![
        Event::Resize {
            width: 400,
            height: 300,
        },
        Event::Expose,
        Event::Close,
    ]);

    app::run(&mut backend, &mut source, &config).unwrap();

    assert_eq!(
        presented(&backend),
        vec![BlitRegion {
            width: 400,
            height: 300
        }]
    );
    let driver = backend.driver().unwrap();
    assert_eq!(driver.size(), (400, 300));
    assert!(driver
        .surface()
        .chunks_exact(4)
        .all(|px| px == [50, 200, 200, 255]));
}

#[test]
fn empty_source_opens_the_configured_default_size() {
    let mut config = Config::default();
    config.window.default_width = 64;
    config.window.default_height = 48;
    let mut source = SolidFill {
        width: 0,
        height: 0,
        rgba: [0; 4],
    };
    let mut backend = scripted(vec![Event::Expose, Event::Close]);

    app::run(&mut backend, &mut source, &config).unwrap();

    let driver = backend.driver().unwrap();
    assert_eq!(
        driver.ops().first(),
        Some(&HeadlessOp::CreateWindow {
            width: 64,
            height: 48
        })
    );
    assert!(presented(&backend).is_empty());
}

#[test]
fn embedded_image_opens_at_its_own_size() {
    let mut config = Config::default();
    config.source.kind = SourceKind::Image;
    let mut source = source::from_config(&config.source);
    let expected = PngImage::Embedded.initial_framebuffer().unwrap();
    let mut backend = scripted(vec![Event::Expose, Event::Close]);

    app::run(&mut backend, &mut source, &config).unwrap();

    let driver = backend.driver().unwrap();
    assert_eq!(driver.size(), (64, 64));
    assert_eq!(driver.surface(), expected.pixels());
    assert_eq!(
        presented(&backend),
        vec![BlitRegion {
            width: 64,
            height: 64
        }]
    );
}

#[test]
fn undecodable_image_fails_before_any_window_opens() {
    let config = Config::default();
    let mut source = PngImage::Bytes(b"\x89PNG truncated".to_vec());
    let mut backend = scripted(vec![Event::Close]);

    let err = app::run(&mut backend, &mut source, &config).unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to decode PNG image"));
    assert!(err.downcast_ref::<DisplayError>().is_none());
    assert_eq!(backend.lifecycle(), Lifecycle::Uninitialized);
    assert!(backend.driver().is_none());
}

struct Malformed;

impl PixelSource for Malformed {
    fn initial_framebuffer(&mut self) -> Result<Framebuffer> {
        Ok(Framebuffer::from_rgba(2, 2, vec![0u8; 3]))
    }
}

#[test]
fn malformed_framebuffer_is_logged_and_the_window_stays_up() {
    let config = Config::default();
    let mut backend = scripted(vec![Event::Expose, Event::Close]);

    app::run(&mut backend, &mut Malformed, &config).unwrap();

    assert_eq!(backend.lifecycle(), Lifecycle::Closed);
    assert!(presented(&backend).is_empty());
}

#[test]
fn unreachable_display_is_a_fatal_error() {
    let config = Config::default();
    let mut source = source::from_config(&SourceConfig::default());
    let mut backend =
        DisplayManager::<HeadlessDisplayDriver>::with_connector(WindowConfig::default(), |_| {
            Err(DisplayError::PlatformInit("cannot open display".into()))
        });

    let err = app::run(&mut backend, &mut source, &config).unwrap_err();

    let display_error = err.downcast_ref::<DisplayError>().unwrap();
    assert!(display_error.is_fatal());
    assert_eq!(backend.lifecycle(), Lifecycle::Uninitialized);
}

#[test]
fn run_after_close_is_reported_not_hung() {
    let config = Config::default();
    let mut source = source::from_config(&config.source);
    let mut backend = scripted(vec![Event::Close]);
    app::run(&mut backend, &mut source, &config).unwrap();

    let err = app::run(&mut backend, &mut source, &config).unwrap_err();
    assert_eq!(
        err.downcast_ref::<DisplayError>(),
        Some(&DisplayError::AlreadyClosed)
    );
}

#[test]
fn backend_is_usable_through_the_trait_object() {
    let config = Config::default();
    let mut source = source::from_config(&config.source);
    let mut backend = scripted(vec![Event::KeyDown { code: 9 }, Event::Close]);
    let dynamic: &mut dyn WindowBackend = &mut backend;

    app::run(dynamic, &mut source, &config).unwrap();
    assert_eq!(backend.lifecycle(), Lifecycle::Closed);
}
