//! X11 DisplayDriver implementation using Xlib.
//!
//! - Window creation through `XCreateSimpleWindow` with the configured background
//! - Input selection derived from the registered [`EventMask`]
//! - `WM_DELETE_WINDOW` protocol so the close button becomes an event
//! - Frames staged as 32bpp ZPixmap `XImage`s and blitted with `XPutImage`
//!
//! X protocol errors are asynchronous. A process-wide handler counts them
//! instead of letting Xlib exit, and `present` syncs and compares the count.

use crate::config::WindowConfig;
use crate::convert::{ConvertedFrame, PixelLayout};
use crate::display::driver::{BlitRegion, DisplayDriver, WindowHandle};
use crate::display::events::{Event, EventMask};
use crate::display::normalize::x11::{normalize, XContext, XRecord};
use crate::error::{DisplayError, Result};
use log::{debug, info, trace, warn};
use std::ffi::{c_int, c_long, c_ulong, CString};
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};
use x11::xlib::*;

static X_ERRORS: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn on_x_error(_display: *mut Display, event: *mut XErrorEvent) -> c_int {
    X_ERRORS.fetch_add(1, Ordering::SeqCst);
    if let Some(event) = event.as_ref() {
        warn!(
            "X error: code {} request {}.{} resource {:#x}",
            event.error_code, event.request_code, event.minor_code, event.resourceid
        );
    }
    0
}

/// Xlib input mask for a set of event classes.
pub fn input_mask(events: EventMask) -> c_long {
    let mut mask = 0;
    if events.contains(EventMask::EXPOSE) {
        mask |= ExposureMask;
    }
    if events.intersects(EventMask::RESIZE | EventMask::CLOSE) {
        mask |= StructureNotifyMask;
    }
    if events.contains(EventMask::KEY) {
        mask |= KeyPressMask | KeyReleaseMask;
    }
    if events.contains(EventMask::BUTTON) {
        mask |= ButtonPressMask | ButtonReleaseMask;
    }
    if events.contains(EventMask::POINTER_MOTION) {
        mask |= PointerMotionMask;
    }
    if events.contains(EventMask::POINTER_CROSSING) {
        mask |= EnterWindowMask | LeaveWindowMask;
    }
    mask
}

/// An `XImage` borrowing the bytes of a converted frame.
///
/// The image data pointer is detached before `XDestroyImage` so Xlib never
/// frees memory owned by Rust.
struct StagedImage {
    image: *mut XImage,
    frame: ConvertedFrame,
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        // SAFETY: `image` came from XCreateImage and is destroyed exactly once.
        unsafe {
            (*self.image).data = ptr::null_mut();
            XDestroyImage(self.image);
        }
    }
}

pub struct X11DisplayDriver {
    display: *mut Display,
    screen: c_int,
    visual: *mut Visual,
    window: Window,
    gc: GC,
    background: c_ulong,
    position: (i32, i32),
    layout: PixelLayout,
    ctx: XContext,
    staged: Option<StagedImage>,
}

impl DisplayDriver for X11DisplayDriver {
    fn connect(config: &WindowConfig) -> Result<Self> {
        let name = config
            .display
            .as_deref()
            .map(CString::new)
            .transpose()
            .map_err(|e| DisplayError::PlatformInit(format!("invalid display name: {}", e)))?;

        // SAFETY: a null name selects $DISPLAY; all calls below operate on
        // the connection just opened.
        unsafe {
            let display = XOpenDisplay(name.as_ref().map_or(ptr::null(), |n| n.as_ptr()));
            if display.is_null() {
                return Err(DisplayError::PlatformInit(match &config.display {
                    Some(name) => format!("cannot open X display '{}'", name),
                    None => "cannot open X display (is DISPLAY set?)".to_string(),
                }));
            }
            XSetErrorHandler(Some(on_x_error));

            let screen = XDefaultScreen(display);
            let visual = XDefaultVisual(display, screen);
            let msb_first = XImageByteOrder(display) == MSBFirst;
            let layout = PixelLayout::for_xlib_visual(
                (*visual).red_mask as u64,
                (*visual).blue_mask as u64,
                msb_first,
            );
            info!(
                "X11DisplayDriver: connected, screen {} depth {} layout {:?}",
                screen,
                XDefaultDepth(display, screen),
                layout.order
            );

            Ok(Self {
                display,
                screen,
                visual,
                window: 0,
                gc: ptr::null_mut(),
                background: config.background_rgb24() as c_ulong,
                position: (config.position_x, config.position_y),
                layout,
                ctx: XContext::default(),
                staged: None,
            })
        }
    }

    fn layout(&self) -> PixelLayout {
        self.layout
    }

    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        events: EventMask,
    ) -> Result<WindowHandle> {
        let title = CString::new(title.replace('\0', ""))
            .map_err(|e| DisplayError::native("XStoreName", e.to_string()))?;

        // SAFETY: `display` is an open connection owned by this driver.
        unsafe {
            let root = XRootWindow(self.display, self.screen);
            let window = XCreateSimpleWindow(
                self.display,
                root,
                self.position.0,
                self.position.1,
                width.max(1),
                height.max(1),
                0,
                XBlackPixel(self.display, self.screen),
                self.background,
            );
            if window == 0 {
                return Err(DisplayError::native("XCreateSimpleWindow", "no window id"));
            }
            XStoreName(self.display, window, title.as_ptr());
            XSelectInput(self.display, window, input_mask(events));

            let mut wm_delete_window =
                XInternAtom(self.display, c"WM_DELETE_WINDOW".as_ptr(), False);
            XSetWMProtocols(self.display, window, &mut wm_delete_window, 1);

            self.gc = XCreateGC(self.display, window, 0, ptr::null_mut());
            self.window = window;
            self.ctx = XContext {
                wm_delete_window: wm_delete_window as u64,
                size: (width, height),
            };

            XMapWindow(self.display, window);
            XFlush(self.display);
            info!("X11DisplayDriver: created window {:#x}", window);
            Ok(WindowHandle(window as u64))
        }
    }

    fn drain_events(&mut self, out: &mut Vec<Event>) -> Result<()> {
        // SAFETY: XNextEvent fills the whole union; only the member matching
        // the event type is read.
        unsafe {
            while XPending(self.display) > 0 {
                let mut event: XEvent = std::mem::zeroed();
                XNextEvent(self.display, &mut event);
                if event.any.window != self.window {
                    continue;
                }
                let record = record_of(&event);
                if let Some(normalized) = normalize(&record, &self.ctx) {
                    if let Event::Resize { width, height } = normalized {
                        self.ctx.size = (width, height);
                    }
                    out.push(normalized);
                }
            }
        }
        Ok(())
    }

    fn stage(&mut self, mut frame: ConvertedFrame) -> Result<()> {
        if frame.width == 0 || frame.height == 0 {
            trace!("X11DisplayDriver: empty frame, nothing to stage");
            self.staged = None;
            return Ok(());
        }
        // SAFETY: the image points into `frame.bytes`, which moves into the
        // StagedImage alongside it. A Vec's heap buffer does not move.
        let image = unsafe {
            XCreateImage(
                self.display,
                self.visual,
                XDefaultDepth(self.display, self.screen) as u32,
                ZPixmap,
                0,
                frame.bytes.as_mut_ptr() as *mut _,
                frame.width,
                frame.height,
                32,
                frame.stride as c_int,
            )
        };
        if image.is_null() {
            return Err(DisplayError::native("XCreateImage", "returned null"));
        }
        // Replacing drops the previous image after the new one exists.
        self.staged = Some(StagedImage { image, frame });
        Ok(())
    }

    fn present(&mut self, region: BlitRegion) -> Result<()> {
        let staged = self
            .staged
            .as_ref()
            .ok_or_else(|| DisplayError::native("XPutImage", "no frame staged"))?;
        let before = X_ERRORS.load(Ordering::SeqCst);

        // SAFETY: window, gc and image are live until destroy_window.
        unsafe {
            XPutImage(
                self.display,
                self.window,
                self.gc,
                staged.image,
                0,
                0,
                0,
                0,
                region.width,
                region.height,
            );
            XSync(self.display, False);
        }

        let after = X_ERRORS.load(Ordering::SeqCst);
        if after != before {
            return Err(DisplayError::native(
                "XPutImage",
                format!("{} X error(s) reported", after - before),
            ));
        }
        trace!("X11DisplayDriver: put {}x{}", region.width, region.height);
        Ok(())
    }

    fn destroy_window(&mut self) {
        if self.display.is_null() {
            return;
        }
        self.staged = None;
        // SAFETY: each resource is released once and then cleared.
        unsafe {
            if !self.gc.is_null() {
                XFreeGC(self.display, self.gc);
                self.gc = ptr::null_mut();
            }
            if self.window != 0 {
                XDestroyWindow(self.display, self.window);
                self.window = 0;
            }
            XCloseDisplay(self.display);
        }
        self.display = ptr::null_mut();
        debug!("X11DisplayDriver: connection closed");
    }
}

impl Drop for X11DisplayDriver {
    fn drop(&mut self) {
        self.destroy_window();
    }
}

/// Flattens the union member matching the event type.
///
/// # Safety
/// `event` must have been filled by Xlib.
unsafe fn record_of(event: &XEvent) -> XRecord {
    let kind = event.get_type();
    let mut record = XRecord {
        kind,
        ..Default::default()
    };
    match kind {
        Expose => {
            let e = event.expose;
            record.x = e.x;
            record.y = e.y;
            record.width = e.width;
            record.height = e.height;
            record.count = e.count;
        }
        ConfigureNotify => {
            let e = event.configure;
            record.x = e.x;
            record.y = e.y;
            record.width = e.width;
            record.height = e.height;
        }
        KeyPress | KeyRelease => {
            let e = event.key;
            record.x = e.x;
            record.y = e.y;
            record.detail = e.keycode;
        }
        ButtonPress | ButtonRelease => {
            let e = event.button;
            record.x = e.x;
            record.y = e.y;
            record.detail = e.button;
        }
        MotionNotify => {
            let e = event.motion;
            record.x = e.x;
            record.y = e.y;
        }
        EnterNotify | LeaveNotify => {
            let e = event.crossing;
            record.x = e.x;
            record.y = e.y;
        }
        ClientMessage => {
            record.message = event.client_message.data.get_long(0) as u64;
        }
        _ => {}
    }
    record
}
