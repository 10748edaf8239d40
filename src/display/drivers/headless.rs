//! Headless display driver: an in-memory surface with scripted events.
//!
//! The surface stores pixels in the driver's layout, so with the default
//! RGBA layout a presented frame can be compared byte for byte against the
//! framebuffer that produced it.

use crate::config::WindowConfig;
use crate::convert::{AlphaMode, ChannelOrder, ConvertedFrame, PixelLayout, RowOrder};
use crate::display::driver::{BlitRegion, DisplayDriver, WindowHandle};
use crate::display::events::{Event, EventMask};
use crate::error::{DisplayError, Result};
use log::{info, trace};
use std::collections::VecDeque;

/// Native calls the headless driver has performed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessOp {
    CreateWindow { width: u32, height: u32 },
    Staged(u64),
    Released(u64),
    Presented(BlitRegion),
    Destroyed,
}

struct Staged {
    id: u64,
    frame: ConvertedFrame,
}

pub struct HeadlessDisplayDriver {
    layout: PixelLayout,
    background: [u8; 4],
    events: EventMask,
    size: (u32, u32),
    surface: Vec<u8>,
    staged: Option<Staged>,
    next_id: u64,
    scripted: VecDeque<Event>,
    ops: Vec<HeadlessOp>,
    fail_stage: bool,
    fail_present: bool,
}

impl HeadlessDisplayDriver {
    /// Straight RGBA, top-down, tightly packed.
    pub const LAYOUT: PixelLayout = PixelLayout {
        order: ChannelOrder::Rgba,
        alpha: AlphaMode::Straight,
        rows: RowOrder::TopDown,
        row_align: 4,
    };

    pub fn new(config: &WindowConfig) -> Self {
        Self::with_layout(config, Self::LAYOUT)
    }

    /// Emulates a surface with a different native layout.
    pub fn with_layout(config: &WindowConfig, layout: PixelLayout) -> Self {
        Self {
            layout,
            background: config.background_rgba(),
            events: EventMask::all(),
            size: (0, 0),
            surface: Vec::new(),
            staged: None,
            next_id: 1,
            scripted: VecDeque::new(),
            ops: Vec::new(),
            fail_stage: false,
            fail_present: false,
        }
    }

    /// Queues an event for the next drain, as if the window system sent it.
    ///
    /// Events of classes not registered at window creation are never
    /// delivered, like a real server honoring the input mask.
    pub fn push_event(&mut self, event: Event) {
        self.scripted.push_back(event);
    }

    pub fn fail_next_stage(&mut self) {
        self.fail_stage = true;
    }

    pub fn fail_next_present(&mut self) {
        self.fail_present = true;
    }

    pub fn ops(&self) -> &[HeadlessOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Window contents in the driver's layout, `size.0 * 4` bytes per row.
    pub fn surface(&self) -> &[u8] {
        &self.surface
    }

    /// Surface bytes of the pixel at `(x, y)`.
    pub fn surface_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.0 || y >= self.size.1 {
            return None;
        }
        let offset = (y as usize * self.size.0 as usize + x as usize) * 4;
        let px = self.surface.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        let count = width as usize * height as usize;
        self.surface.clear();
        self.surface.reserve(count * 4);
        for _ in 0..count {
            self.surface.extend_from_slice(&self.native_background());
        }
    }

    /// The background color in the surface's channel order.
    fn native_background(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (channel, offset) in self.layout.order.offsets().into_iter().enumerate() {
            out[offset] = self.background[channel];
        }
        out
    }
}

impl DisplayDriver for HeadlessDisplayDriver {
    fn connect(config: &WindowConfig) -> Result<Self> {
        info!("HeadlessDisplayDriver: connected");
        Ok(Self::new(config))
    }

    fn layout(&self) -> PixelLayout {
        self.layout
    }

    fn create_window(
        &mut self,
        _title: &str,
        width: u32,
        height: u32,
        events: EventMask,
    ) -> Result<WindowHandle> {
        self.events = events;
        self.resize_surface(width, height);
        self.ops.push(HeadlessOp::CreateWindow { width, height });
        Ok(WindowHandle(1))
    }

    fn drain_events(&mut self, out: &mut Vec<Event>) -> Result<()> {
        while let Some(event) = self.scripted.pop_front() {
            if !self.events.admits(&event) {
                continue;
            }
            if let Event::Resize { width, height } = event {
                self.resize_surface(width, height);
            }
            out.push(event);
        }
        Ok(())
    }

    fn stage(&mut self, frame: ConvertedFrame) -> Result<()> {
        if std::mem::take(&mut self.fail_stage) {
            return Err(DisplayError::native("stage", "injected failure"));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ops.push(HeadlessOp::Staged(id));
        if let Some(old) = self.staged.replace(Staged { id, frame }) {
            self.ops.push(HeadlessOp::Released(old.id));
        }
        Ok(())
    }

    fn present(&mut self, region: BlitRegion) -> Result<()> {
        if std::mem::take(&mut self.fail_present) {
            return Err(DisplayError::native("present", "injected failure"));
        }
        let staged = self
            .staged
            .as_ref()
            .ok_or_else(|| DisplayError::native("present", "nothing staged"))?;

        let width = region.width.min(self.size.0).min(staged.frame.width) as usize;
        let height = region.height.min(self.size.1).min(staged.frame.height);
        let surface_stride = self.size.0 as usize * 4;
        for y in 0..height {
            let Some(src) = staged.frame.row(y) else {
                break;
            };
            let dst = y as usize * surface_stride;
            self.surface[dst..dst + width * 4].copy_from_slice(&src[..width * 4]);
        }
        trace!("HeadlessDisplayDriver: presented {}x{}", width, height);
        self.ops.push(HeadlessOp::Presented(region));
        Ok(())
    }

    fn destroy_window(&mut self) {
        if let Some(old) = self.staged.take() {
            self.ops.push(HeadlessOp::Released(old.id));
        }
        self.ops.push(HeadlessOp::Destroyed);
    }
}
