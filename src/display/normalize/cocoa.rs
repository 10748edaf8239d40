//! `NSEvent` mapping.

use crate::display::events::Event;

/// `NSEventType` raw values.
pub mod event_type {
    pub const LEFT_MOUSE_DOWN: u64 = 1;
    pub const LEFT_MOUSE_UP: u64 = 2;
    pub const RIGHT_MOUSE_DOWN: u64 = 3;
    pub const RIGHT_MOUSE_UP: u64 = 4;
    pub const MOUSE_MOVED: u64 = 5;
    pub const LEFT_MOUSE_DRAGGED: u64 = 6;
    pub const RIGHT_MOUSE_DRAGGED: u64 = 7;
    pub const MOUSE_ENTERED: u64 = 8;
    pub const MOUSE_EXITED: u64 = 9;
    pub const KEY_DOWN: u64 = 10;
    pub const KEY_UP: u64 = 11;
    pub const OTHER_MOUSE_DOWN: u64 = 25;
    pub const OTHER_MOUSE_UP: u64 = 26;
    pub const OTHER_MOUSE_DRAGGED: u64 = 27;

    pub fn is_key(ty: u64) -> bool {
        matches!(ty, KEY_DOWN | KEY_UP)
    }

    pub fn is_mouse(ty: u64) -> bool {
        matches!(
            ty,
            LEFT_MOUSE_DOWN..=MOUSE_EXITED | OTHER_MOUSE_DOWN..=OTHER_MOUSE_DRAGGED
        )
    }
}

/// The fields of an `NSEvent` the mapping reads.
///
/// `key_code` is only meaningful for key events, `button_number` only for
/// "other mouse" events; AppKit raises if they are read on the wrong type,
/// so the driver fills them conditionally.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CocoaRecord {
    pub kind: u64,
    pub key_code: u16,
    pub button_number: i64,
    /// `locationInWindow`, bottom-left origin.
    pub location: (f64, f64),
}

/// Maps one event. `content_height` flips AppKit's bottom-left origin.
pub fn normalize(record: &CocoaRecord, content_height: f64) -> Option<Event> {
    use event_type::*;

    let x = record.location.0.floor() as i32;
    let y = (content_height - record.location.1).floor() as i32;
    let button = |button: u8, pressed: bool| Event::MouseButton {
        button,
        pressed,
        x,
        y,
    };

    match record.kind {
        KEY_DOWN => Some(Event::KeyDown {
            code: record.key_code as u32,
        }),
        KEY_UP => Some(Event::KeyUp {
            code: record.key_code as u32,
        }),
        LEFT_MOUSE_DOWN => Some(button(1, true)),
        LEFT_MOUSE_UP => Some(button(1, false)),
        RIGHT_MOUSE_DOWN => Some(button(3, true)),
        RIGHT_MOUSE_UP => Some(button(3, false)),
        OTHER_MOUSE_DOWN | OTHER_MOUSE_UP => Some(button(
            other_button(record.button_number),
            record.kind == OTHER_MOUSE_DOWN,
        )),
        MOUSE_MOVED | LEFT_MOUSE_DRAGGED | RIGHT_MOUSE_DRAGGED | OTHER_MOUSE_DRAGGED => {
            Some(Event::MouseMove { x, y })
        }
        MOUSE_ENTERED => Some(Event::MouseEnter { x, y }),
        MOUSE_EXITED => Some(Event::MouseLeave { x, y }),
        _ => None,
    }
}

/// AppKit numbers the middle button 2 and extra buttons from 3; X11 puts
/// extra buttons after the wheel at 8.
fn other_button(number: i64) -> u8 {
    match number {
        2 => 2,
        n => (n + 5).clamp(0, u8::MAX as i64) as u8,
    }
}

/// Window and application visibility sampled after a drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowVisibility {
    pub visible: bool,
    pub miniaturized: bool,
    /// `-[NSApplication isHidden]`. Hiding the app orders every window out.
    pub app_hidden: bool,
}

impl WindowVisibility {
    /// A window the user closed is ordered out while neither miniaturized
    /// nor hidden along with the application.
    pub fn is_closed(&self) -> bool {
        !self.visible && !self.miniaturized && !self.app_hidden
    }
}

#[cfg(test)]
mod tests {
    use super::event_type::*;
    use super::*;

    fn at(kind: u64, x: f64, y: f64) -> CocoaRecord {
        CocoaRecord {
            kind,
            location: (x, y),
            ..Default::default()
        }
    }

    #[test]
    fn y_is_flipped_to_top_left_origin() {
        assert_eq!(
            normalize(&at(MOUSE_MOVED, 10.0, 590.0), 600.0),
            Some(Event::MouseMove { x: 10, y: 10 })
        );
        assert_eq!(
            normalize(&at(LEFT_MOUSE_DOWN, 0.0, 600.0), 600.0),
            Some(Event::MouseButton {
                button: 1,
                pressed: true,
                x: 0,
                y: 0
            })
        );
    }

    #[test]
    fn right_and_other_buttons_use_x11_numbering() {
        assert_eq!(
            normalize(&at(RIGHT_MOUSE_UP, 1.0, 1.0), 2.0),
            Some(Event::MouseButton {
                button: 3,
                pressed: false,
                x: 1,
                y: 1
            })
        );
        let mut middle = at(OTHER_MOUSE_DOWN, 0.0, 0.0);
        middle.button_number = 2;
        assert!(matches!(
            normalize(&middle, 0.0),
            Some(Event::MouseButton { button: 2, pressed: true, .. })
        ));
        middle.button_number = 3;
        assert!(matches!(
            normalize(&middle, 0.0),
            Some(Event::MouseButton { button: 8, .. })
        ));
    }

    #[test]
    fn keys_pass_virtual_keycode_through() {
        let record = CocoaRecord {
            kind: KEY_UP,
            key_code: 0x35,
            ..Default::default()
        };
        assert_eq!(normalize(&record, 0.0), Some(Event::KeyUp { code: 0x35 }));
        assert!(is_key(KEY_DOWN));
        assert!(!is_mouse(KEY_DOWN));
        assert!(is_mouse(OTHER_MOUSE_DRAGGED));
    }

    #[test]
    fn drags_are_motion_and_crossings_are_enter_leave() {
        assert_eq!(
            normalize(&at(LEFT_MOUSE_DRAGGED, 3.0, 4.0), 10.0),
            Some(Event::MouseMove { x: 3, y: 6 })
        );
        assert_eq!(
            normalize(&at(MOUSE_EXITED, 3.0, 4.0), 10.0),
            Some(Event::MouseLeave { x: 3, y: 6 })
        );
    }

    #[test]
    fn flags_changed_and_scroll_are_ignored() {
        assert_eq!(normalize(&at(12, 0.0, 0.0), 0.0), None);
        assert_eq!(normalize(&at(22, 0.0, 0.0), 0.0), None);
    }

    #[test]
    fn only_an_ordered_out_window_counts_as_closed() {
        let closed = WindowVisibility::default();
        assert!(closed.is_closed());

        let shown = WindowVisibility {
            visible: true,
            ..Default::default()
        };
        assert!(!shown.is_closed());

        let minimized = WindowVisibility {
            miniaturized: true,
            ..Default::default()
        };
        assert!(!minimized.is_closed());
    }

    #[test]
    fn hiding_the_application_is_not_a_close() {
        let hidden = WindowVisibility {
            app_hidden: true,
            ..Default::default()
        };
        assert!(!hidden.is_closed());
    }
}
