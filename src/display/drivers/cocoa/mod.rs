//! Cocoa DisplayDriver implementation using the raw Objective-C runtime.
//!
//! The window's content view is layer-backed. A staged frame is a `CGImage`
//! over a private copy of the converted bytes; presenting sets it as the
//! layer's contents with top-left gravity, so the image is never scaled and
//! the layer bounds crop whatever does not fit.
//!
//! AppKit only allows window work on the main thread, which `connect` checks.

mod sys;

use crate::config::WindowConfig;
use crate::convert::{ConvertedFrame, PixelLayout};
use crate::display::driver::{BlitRegion, DisplayDriver, WindowHandle};
use crate::display::events::{Event, EventMask};
use crate::display::normalize::cocoa::{event_type, normalize, CocoaRecord, WindowVisibility};
use crate::error::{DisplayError, Result};
use log::{debug, info, trace};
use std::ptr;
use sys::{AutoreleasePool, CGPoint, CGRect, Id, BOOL, NO, YES};

const STYLE_MASK: u64 = sys::NS_WINDOW_STYLE_MASK_TITLED
    | sys::NS_WINDOW_STYLE_MASK_CLOSABLE
    | sys::NS_WINDOW_STYLE_MASK_MINIATURIZABLE
    | sys::NS_WINDOW_STYLE_MASK_RESIZABLE;

/// A `CGImage` released when dropped.
struct StagedImage(sys::CGImageRef);

impl Drop for StagedImage {
    fn drop(&mut self) {
        // SAFETY: created by CGImageCreate, released exactly once.
        unsafe { sys::CGImageRelease(self.0) }
    }
}

pub struct CocoaDisplayDriver {
    app: Id,
    window: Id,
    view: Id,
    layer: Id,
    background: [u8; 3],
    position: (i32, i32),
    events: EventMask,
    size: (u32, u32),
    /// The first drain reports an Expose so the frame is painted once shown.
    initial_expose: bool,
    staged: Option<StagedImage>,
}

impl CocoaDisplayDriver {
    fn is_main_thread() -> bool {
        // SAFETY: +[NSThread isMainThread] is safe from any thread.
        unsafe {
            let is_main: BOOL = sys::send(sys::class(b"NSThread\0"), sys::sel(b"isMainThread\0"));
            is_main == YES
        }
    }

    fn content_size(&self) -> (u32, u32) {
        // SAFETY: `view` is the live content view of `window`.
        let bounds = unsafe { sys::send_rect(self.view, sys::sel(b"bounds\0")) };
        (
            bounds.size.width.max(0.0) as u32,
            bounds.size.height.max(0.0) as u32,
        )
    }

    /// Converts one dequeued `NSEvent` targeted at our window.
    unsafe fn record_of(event: Id, ty: u64) -> CocoaRecord {
        let mut record = CocoaRecord {
            kind: ty,
            ..Default::default()
        };
        if event_type::is_key(ty) {
            record.key_code = sys::send(event, sys::sel(b"keyCode\0"));
        }
        if event_type::is_mouse(ty) {
            let location: CGPoint = sys::send(event, sys::sel(b"locationInWindow\0"));
            record.location = (location.x, location.y);
        }
        if matches!(
            ty,
            event_type::OTHER_MOUSE_DOWN | event_type::OTHER_MOUSE_UP | event_type::OTHER_MOUSE_DRAGGED
        ) {
            record.button_number = sys::send(event, sys::sel(b"buttonNumber\0"));
        }
        record
    }

    fn push(&self, out: &mut Vec<Event>, event: Event) {
        if self.events.admits(&event) {
            out.push(event);
        }
    }
}

impl DisplayDriver for CocoaDisplayDriver {
    fn connect(config: &WindowConfig) -> Result<Self> {
        if !Self::is_main_thread() {
            return Err(DisplayError::PlatformInit(
                "Cocoa windows must be created on the main thread".to_string(),
            ));
        }

        // SAFETY: main thread, checked above.
        let app = unsafe {
            let _pool = AutoreleasePool::push();
            let app: Id = sys::send(
                sys::class(b"NSApplication\0"),
                sys::sel(b"sharedApplication\0"),
            );
            if app.is_null() {
                return Err(DisplayError::PlatformInit(
                    "NSApplication is unavailable".to_string(),
                ));
            }
            sys::send_1::<BOOL, i64>(
                app,
                sys::sel(b"setActivationPolicy:\0"),
                sys::NS_APPLICATION_ACTIVATION_POLICY_REGULAR,
            );
            sys::send::<()>(app, sys::sel(b"finishLaunching\0"));
            app
        };
        info!("CocoaDisplayDriver: NSApplication ready");

        Ok(Self {
            app,
            window: ptr::null_mut(),
            view: ptr::null_mut(),
            layer: ptr::null_mut(),
            background: config.background,
            position: (config.position_x, config.position_y),
            events: EventMask::all(),
            size: (0, 0),
            initial_expose: false,
            staged: None,
        })
    }

    fn layout(&self) -> PixelLayout {
        PixelLayout::COCOA
    }

    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        events: EventMask,
    ) -> Result<WindowHandle> {
        let rect = CGRect::new(
            self.position.0 as f64,
            self.position.1 as f64,
            width as f64,
            height as f64,
        );

        // SAFETY: main thread; every object below is owned by the window or
        // released before returning.
        unsafe {
            let _pool = AutoreleasePool::push();
            let alloc: Id = sys::send(sys::class(b"NSWindow\0"), sys::sel(b"alloc\0"));
            let window: Id = sys::send_4(
                alloc,
                sys::sel(b"initWithContentRect:styleMask:backing:defer:\0"),
                rect,
                STYLE_MASK,
                sys::NS_BACKING_STORE_BUFFERED,
                NO,
            );
            if window.is_null() {
                return Err(DisplayError::native("NSWindow", "initWithContentRect failed"));
            }
            // We release it ourselves in destroy_window.
            sys::send_1::<(), BOOL>(window, sys::sel(b"setReleasedWhenClosed:\0"), NO);

            let ns_title = sys::ns_string(title);
            sys::send_1::<(), Id>(window, sys::sel(b"setTitle:\0"), ns_title);
            sys::release(ns_title);

            let [r, g, b] = self.background;
            let color: Id = sys::send_4(
                sys::class(b"NSColor\0"),
                sys::sel(b"colorWithSRGBRed:green:blue:alpha:\0"),
                r as f64 / 255.0,
                g as f64 / 255.0,
                b as f64 / 255.0,
                1.0f64,
            );
            sys::send_1::<(), Id>(window, sys::sel(b"setBackgroundColor:\0"), color);

            let view: Id = sys::send(window, sys::sel(b"contentView\0"));
            sys::send_1::<(), BOOL>(view, sys::sel(b"setWantsLayer:\0"), YES);
            let layer: Id = sys::send(view, sys::sel(b"layer\0"));
            if layer.is_null() {
                sys::release(window);
                return Err(DisplayError::native("NSView", "content view has no layer"));
            }
            let gravity = sys::ns_string("topLeft");
            sys::send_1::<(), Id>(layer, sys::sel(b"setContentsGravity:\0"), gravity);
            sys::release(gravity);
            sys::send_1::<(), BOOL>(layer, sys::sel(b"setMasksToBounds:\0"), YES);
            sys::send_1::<(), f64>(layer, sys::sel(b"setContentsScale:\0"), 1.0);

            if events.contains(EventMask::POINTER_MOTION) {
                sys::send_1::<(), BOOL>(window, sys::sel(b"setAcceptsMouseMovedEvents:\0"), YES);
            }
            if events.contains(EventMask::POINTER_CROSSING) {
                let area: Id = sys::send(sys::class(b"NSTrackingArea\0"), sys::sel(b"alloc\0"));
                let area: Id = sys::send_4(
                    area,
                    sys::sel(b"initWithRect:options:owner:userInfo:\0"),
                    CGRect::new(0.0, 0.0, 0.0, 0.0),
                    sys::NS_TRACKING_MOUSE_ENTERED_AND_EXITED
                        | sys::NS_TRACKING_ACTIVE_ALWAYS
                        | sys::NS_TRACKING_IN_VISIBLE_RECT,
                    view,
                    ptr::null_mut::<std::ffi::c_void>(),
                );
                sys::send_1::<(), Id>(view, sys::sel(b"addTrackingArea:\0"), area);
                sys::release(area);
            }

            sys::send_1::<(), Id>(window, sys::sel(b"makeKeyAndOrderFront:\0"), ptr::null_mut());
            sys::send_1::<(), BOOL>(self.app, sys::sel(b"activateIgnoringOtherApps:\0"), YES);

            self.window = window;
            self.view = view;
            self.layer = layer;
        }

        self.events = events;
        self.size = (width, height);
        self.initial_expose = true;
        info!("CocoaDisplayDriver: created window {:p}", self.window);
        Ok(WindowHandle(self.window as u64))
    }

    fn drain_events(&mut self, out: &mut Vec<Event>) -> Result<()> {
        let _pool = AutoreleasePool::push();
        if std::mem::take(&mut self.initial_expose) {
            self.push(out, Event::Expose);
        }

        // SAFETY: main thread; events are autoreleased into `_pool`.
        unsafe {
            let distant_past: Id =
                sys::send(sys::class(b"NSDate\0"), sys::sel(b"distantPast\0"));
            loop {
                let event: Id = sys::send_4(
                    self.app,
                    sys::sel(b"nextEventMatchingMask:untilDate:inMode:dequeue:\0"),
                    u64::MAX,
                    distant_past,
                    sys::NSDefaultRunLoopMode,
                    YES,
                );
                if event.is_null() {
                    break;
                }
                let ty: u64 = sys::send(event, sys::sel(b"type\0"));
                let target: Id = sys::send(event, sys::sel(b"window\0"));
                if target == self.window {
                    let record = Self::record_of(event, ty);
                    if let Some(normalized) = normalize(&record, self.size.1 as f64) {
                        self.push(out, normalized);
                    }
                }
                // Key events stay with us; AppKit would beep for unhandled keys.
                if !event_type::is_key(ty) {
                    sys::send_1::<(), Id>(self.app, sys::sel(b"sendEvent:\0"), event);
                }
            }
            sys::send::<()>(self.app, sys::sel(b"updateWindows\0"));

            let visible: BOOL = sys::send(self.window, sys::sel(b"isVisible\0"));
            let miniaturized: BOOL = sys::send(self.window, sys::sel(b"isMiniaturized\0"));
            let app_hidden: BOOL = sys::send(self.app, sys::sel(b"isHidden\0"));
            let visibility = WindowVisibility {
                visible: visible == YES,
                miniaturized: miniaturized == YES,
                app_hidden: app_hidden == YES,
            };
            if visibility.is_closed() {
                debug!("CocoaDisplayDriver: window closed by user");
                self.push(out, Event::Close);
                return Ok(());
            }
        }

        let size = self.content_size();
        if size != self.size {
            self.size = size;
            self.push(
                out,
                Event::Resize {
                    width: size.0,
                    height: size.1,
                },
            );
            self.push(out, Event::Expose);
        }
        Ok(())
    }

    fn stage(&mut self, frame: ConvertedFrame) -> Result<()> {
        if frame.width == 0 || frame.height == 0 {
            self.staged = None;
            return Ok(());
        }

        // SAFETY: CFDataCreate copies the bytes, so `frame` may be dropped
        // once the image exists. Intermediate objects are released here.
        let image = unsafe {
            let data = sys::CFDataCreate(ptr::null(), frame.bytes.as_ptr(), frame.bytes.len() as isize);
            if data.is_null() {
                return Err(DisplayError::native("CFDataCreate", "returned null"));
            }
            let provider = sys::CGDataProviderCreateWithCFData(data);
            sys::CFRelease(data);
            if provider.is_null() {
                return Err(DisplayError::native("CGDataProviderCreateWithCFData", "returned null"));
            }
            let space = sys::CGColorSpaceCreateDeviceRGB();
            let image = sys::CGImageCreate(
                frame.width as usize,
                frame.height as usize,
                8,
                32,
                frame.stride,
                space,
                sys::K_CG_IMAGE_ALPHA_PREMULTIPLIED_LAST,
                provider,
                ptr::null(),
                false,
                sys::K_CG_RENDERING_INTENT_DEFAULT,
            );
            sys::CGColorSpaceRelease(space);
            sys::CGDataProviderRelease(provider);
            image
        };
        if image.is_null() {
            return Err(DisplayError::native("CGImageCreate", "returned null"));
        }
        self.staged = Some(StagedImage(image));
        Ok(())
    }

    fn present(&mut self, region: BlitRegion) -> Result<()> {
        let staged = self
            .staged
            .as_ref()
            .ok_or_else(|| DisplayError::native("setContents", "no frame staged"))?;

        // SAFETY: main thread; the layer retains the image it is given.
        unsafe {
            let transaction = sys::class(b"CATransaction\0");
            sys::send::<()>(transaction, sys::sel(b"begin\0"));
            sys::send_1::<(), BOOL>(transaction, sys::sel(b"setDisableActions:\0"), YES);
            sys::send_1::<(), Id>(self.layer, sys::sel(b"setContents:\0"), staged.0);
            sys::send::<()>(transaction, sys::sel(b"commit\0"));
        }
        trace!("CocoaDisplayDriver: presented {}x{}", region.width, region.height);
        Ok(())
    }

    fn destroy_window(&mut self) {
        if self.window.is_null() {
            return;
        }
        // SAFETY: the window was created (and is owned) by this driver.
        unsafe {
            let _pool = AutoreleasePool::push();
            sys::send_1::<(), Id>(self.layer, sys::sel(b"setContents:\0"), ptr::null_mut());
            sys::send::<()>(self.window, sys::sel(b"close\0"));
            sys::release(self.window);
        }
        self.staged = None;
        self.window = ptr::null_mut();
        self.view = ptr::null_mut();
        self.layer = ptr::null_mut();
        debug!("CocoaDisplayDriver: window released");
    }
}

impl Drop for CocoaDisplayDriver {
    fn drop(&mut self) {
        self.destroy_window();
    }
}
