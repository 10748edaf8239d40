//! Xlib `XEvent` mapping.

use crate::display::events::Event;

/// Core protocol event type codes (X11/X.h).
pub mod codes {
    pub const KEY_PRESS: i32 = 2;
    pub const KEY_RELEASE: i32 = 3;
    pub const BUTTON_PRESS: i32 = 4;
    pub const BUTTON_RELEASE: i32 = 5;
    pub const MOTION_NOTIFY: i32 = 6;
    pub const ENTER_NOTIFY: i32 = 7;
    pub const LEAVE_NOTIFY: i32 = 8;
    pub const EXPOSE: i32 = 12;
    pub const DESTROY_NOTIFY: i32 = 17;
    pub const CONFIGURE_NOTIFY: i32 = 22;
    pub const CLIENT_MESSAGE: i32 = 33;
}

/// The fields of an `XEvent` the mapping reads.
///
/// `detail` is the keycode for key events and the button for button events.
/// `count` is the Expose count. `message` is `data.l[0]` of a ClientMessage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XRecord {
    pub kind: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub detail: u32,
    pub count: i32,
    pub message: u64,
}

/// Per-window state the mapping needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct XContext {
    pub wm_delete_window: u64,
    pub size: (u32, u32),
}

pub fn normalize(record: &XRecord, ctx: &XContext) -> Option<Event> {
    use codes::*;

    match record.kind {
        // Only the last Expose of a series repaints.
        EXPOSE if record.count == 0 => Some(Event::Expose),
        EXPOSE => None,
        CONFIGURE_NOTIFY => {
            let size = (record.width.max(0) as u32, record.height.max(0) as u32);
            // ConfigureNotify also reports moves and restacking.
            (size != ctx.size).then_some(Event::Resize {
                width: size.0,
                height: size.1,
            })
        }
        KEY_PRESS => Some(Event::KeyDown {
            code: record.detail,
        }),
        KEY_RELEASE => Some(Event::KeyUp {
            code: record.detail,
        }),
        BUTTON_PRESS | BUTTON_RELEASE => Some(Event::MouseButton {
            button: record.detail.min(u8::MAX as u32) as u8,
            pressed: record.kind == BUTTON_PRESS,
            x: record.x,
            y: record.y,
        }),
        MOTION_NOTIFY => Some(Event::MouseMove {
            x: record.x,
            y: record.y,
        }),
        ENTER_NOTIFY => Some(Event::MouseEnter {
            x: record.x,
            y: record.y,
        }),
        LEAVE_NOTIFY => Some(Event::MouseLeave {
            x: record.x,
            y: record.y,
        }),
        CLIENT_MESSAGE if record.message == ctx.wm_delete_window => Some(Event::Close),
        CLIENT_MESSAGE => None,
        DESTROY_NOTIFY => Some(Event::Close),
        _ => None,
    }
}
