// src/display/manager.rs
//! DisplayManager - the shared window state machine on top of a DisplayDriver.

use crate::config::WindowConfig;
use crate::convert::convert;
use crate::display::backend::{Lifecycle, WindowBackend, WindowState};
use crate::display::driver::{BlitRegion, DisplayDriver};
use crate::display::events::Event;
use crate::error::{DisplayError, Result};
use crate::framebuffer::Framebuffer;
use log::{debug, info, trace, warn};

type Connector<D> = Box<dyn FnOnce(&WindowConfig) -> Result<D>>;

/// Implements [`WindowBackend`] for any driver.
pub struct DisplayManager<D: DisplayDriver> {
    config: WindowConfig,
    connector: Option<Connector<D>>,
    driver: Option<D>,
    lifecycle: Lifecycle,
    state: Option<WindowState>,
    framebuffer: Option<Framebuffer>,
}

impl<D: DisplayDriver> DisplayManager<D> {
    /// Connects through `D::connect` when opened.
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            connector: None,
            driver: None,
            lifecycle: Lifecycle::Uninitialized,
            state: None,
            framebuffer: None,
        }
    }

    /// Connects through `connector` instead of `D::connect` on the first open.
    pub fn with_connector(
        config: WindowConfig,
        connector: impl FnOnce(&WindowConfig) -> Result<D> + 'static,
    ) -> Self {
        let mut manager = Self::new(config);
        manager.connector = Some(Box::new(connector));
        manager
    }

    pub fn driver(&self) -> Option<&D> {
        self.driver.as_ref()
    }

    pub fn driver_mut(&mut self) -> Option<&mut D> {
        self.driver.as_mut()
    }

    /// The framebuffer shown on the next repaint.
    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.framebuffer.as_ref()
    }

    /// Fails unless a native window exists.
    fn live_driver(&mut self) -> Result<&mut D> {
        match self.lifecycle {
            Lifecycle::Uninitialized => Err(DisplayError::NotOpen),
            Lifecycle::Closing | Lifecycle::Closed => Err(DisplayError::AlreadyClosed),
            Lifecycle::Open | Lifecycle::Running => {
                self.driver.as_mut().ok_or(DisplayError::NotOpen)
            }
        }
    }

    fn repaint(&mut self) {
        let (Some(state), Some(fb)) = (self.state, self.framebuffer.as_ref()) else {
            return;
        };
        let region = BlitRegion::clip(state.size, fb.size());
        if region.is_empty() {
            trace!("Skipping empty blit");
            return;
        }
        let Some(driver) = self.driver.as_mut() else {
            return;
        };
        trace!("Blitting {}x{}", region.width, region.height);
        if let Err(e) = driver.present(region) {
            warn!("Skipping repaint: {}", e);
        }
    }

    fn teardown(&mut self) {
        self.lifecycle = Lifecycle::Closing;
        if let Some(driver) = self.driver.as_mut() {
            driver.destroy_window();
        }
        if let Some(state) = self.state.as_mut() {
            state.is_open = false;
        }
        self.framebuffer = None;
        self.lifecycle = Lifecycle::Closed;
        info!("Window closed");
    }
}

impl<D: DisplayDriver> WindowBackend for DisplayManager<D> {
    fn open(&mut self, title: &str, width: u32, height: u32) -> Result<WindowState> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Closing | Lifecycle::Closed => return Err(DisplayError::AlreadyClosed),
            Lifecycle::Open | Lifecycle::Running => return Err(DisplayError::AlreadyOpen),
        }

        let mut driver = match self.connector.take() {
            Some(connector) => connector(&self.config)?,
            None => D::connect(&self.config)?,
        };
        let events = self.config.events.registered();
        let handle = driver.create_window(title, width, height, events)?;
        info!(
            "Opened window {:?} '{}' {}x{} ({:?})",
            handle, title, width, height, events
        );

        let state = WindowState {
            handle,
            size: (width, height),
            is_open: true,
        };
        self.driver = Some(driver);
        self.state = Some(state);
        self.lifecycle = Lifecycle::Open;
        Ok(state)
    }

    fn set_framebuffer(&mut self, framebuffer: Framebuffer) -> Result<()> {
        let driver = self.live_driver()?;
        framebuffer.validate()?;
        let frame = convert(&framebuffer, driver.layout())?;
        driver.stage(frame)?;
        debug!(
            "Framebuffer {}x{} staged",
            framebuffer.width(),
            framebuffer.height()
        );
        self.framebuffer = Some(framebuffer);
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<Event>> {
        let mut raw = Vec::new();
        self.live_driver()?.drain_events(&mut raw)?;
        if self.lifecycle == Lifecycle::Open {
            self.lifecycle = Lifecycle::Running;
        }

        let mask = self.config.events.registered();
        let mut events = Vec::with_capacity(raw.len());
        for event in raw {
            if !mask.admits(&event) {
                continue;
            }
            debug!("Event: {:?}", event);
            events.push(event);
            match event {
                Event::Expose => self.repaint(),
                Event::Resize { width, height } => {
                    if let Some(state) = self.state.as_mut() {
                        state.size = (width, height);
                    }
                }
                Event::Close => {
                    self.teardown();
                    break;
                }
                _ => {}
            }
        }
        Ok(events)
    }

    fn close(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Uninitialized => Err(DisplayError::NotOpen),
            Lifecycle::Closing | Lifecycle::Closed => Ok(()),
            Lifecycle::Open | Lifecycle::Running => {
                self.teardown();
                Ok(())
            }
        }
    }

    fn window_state(&self) -> Result<WindowState> {
        match self.lifecycle {
            Lifecycle::Uninitialized => Err(DisplayError::NotOpen),
            Lifecycle::Closing | Lifecycle::Closed => Err(DisplayError::AlreadyClosed),
            Lifecycle::Open | Lifecycle::Running => self.state.ok_or(DisplayError::NotOpen),
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}

impl<D: DisplayDriver> Drop for DisplayManager<D> {
    fn drop(&mut self) {
        if self.lifecycle.is_live() {
            self.teardown();
        }
    }
}
