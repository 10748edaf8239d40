//! Window procedure message mapping.

use crate::display::events::Event;

/// Window message identifiers (WinUser.h).
pub mod messages {
    pub const WM_DESTROY: u32 = 0x0002;
    pub const WM_SIZE: u32 = 0x0005;
    pub const WM_PAINT: u32 = 0x000F;
    pub const WM_CLOSE: u32 = 0x0010;
    pub const WM_KEYDOWN: u32 = 0x0100;
    pub const WM_KEYUP: u32 = 0x0101;
    pub const WM_SYSKEYDOWN: u32 = 0x0104;
    pub const WM_SYSKEYUP: u32 = 0x0105;
    pub const WM_MOUSEMOVE: u32 = 0x0200;
    pub const WM_LBUTTONDOWN: u32 = 0x0201;
    pub const WM_LBUTTONUP: u32 = 0x0202;
    pub const WM_RBUTTONDOWN: u32 = 0x0204;
    pub const WM_RBUTTONUP: u32 = 0x0205;
    pub const WM_MBUTTONDOWN: u32 = 0x0207;
    pub const WM_MBUTTONUP: u32 = 0x0208;
    pub const WM_MOUSELEAVE: u32 = 0x02A3;
}

/// `wParam` of WM_SIZE when the window was minimized.
const SIZE_MINIMIZED: usize = 1;

/// Signed x from a client-area mouse `lParam` (GET_X_LPARAM).
pub fn x_lparam(lparam: isize) -> i32 {
    (lparam & 0xFFFF) as u16 as i16 as i32
}

/// Signed y from a client-area mouse `lParam` (GET_Y_LPARAM).
pub fn y_lparam(lparam: isize) -> i32 {
    ((lparam >> 16) & 0xFFFF) as u16 as i16 as i32
}

/// Maps one window message. `pointer` is the last client position seen,
/// used for WM_MOUSELEAVE which carries no coordinates.
pub fn normalize(msg: u32, wparam: usize, lparam: isize, pointer: (i32, i32)) -> Option<Event> {
    use messages::*;

    let button = |button: u8, pressed: bool| Event::MouseButton {
        button,
        pressed,
        x: x_lparam(lparam),
        y: y_lparam(lparam),
    };

    match msg {
        WM_PAINT => Some(Event::Expose),
        WM_SIZE if wparam == SIZE_MINIMIZED => None,
        WM_SIZE => Some(Event::Resize {
            width: (lparam & 0xFFFF) as u32,
            height: ((lparam >> 16) & 0xFFFF) as u32,
        }),
        WM_KEYDOWN | WM_SYSKEYDOWN => Some(Event::KeyDown {
            code: wparam as u32,
        }),
        WM_KEYUP | WM_SYSKEYUP => Some(Event::KeyUp {
            code: wparam as u32,
        }),
        WM_MOUSEMOVE => Some(Event::MouseMove {
            x: x_lparam(lparam),
            y: y_lparam(lparam),
        }),
        WM_LBUTTONDOWN => Some(button(1, true)),
        WM_LBUTTONUP => Some(button(1, false)),
        WM_MBUTTONDOWN => Some(button(2, true)),
        WM_MBUTTONUP => Some(button(2, false)),
        WM_RBUTTONDOWN => Some(button(3, true)),
        WM_RBUTTONUP => Some(button(3, false)),
        WM_MOUSELEAVE => Some(Event::MouseLeave {
            x: pointer.0,
            y: pointer.1,
        }),
        WM_CLOSE | WM_DESTROY => Some(Event::Close),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::messages::*;
    use super::*;

    fn lparam(x: i16, y: i16) -> isize {
        ((y as u16 as isize) << 16) | x as u16 as isize
    }

    #[test]
    fn paint_is_expose_and_close_is_close() {
        assert_eq!(normalize(WM_PAINT, 0, 0, (0, 0)), Some(Event::Expose));
        assert_eq!(normalize(WM_CLOSE, 0, 0, (0, 0)), Some(Event::Close));
        assert_eq!(normalize(WM_DESTROY, 0, 0, (0, 0)), Some(Event::Close));
    }

    #[test]
    fn size_reads_client_dimensions_and_skips_minimize() {
        let lp = (300 << 16) | 400;
        assert_eq!(
            normalize(WM_SIZE, 0, lp, (0, 0)),
            Some(Event::Resize {
                width: 400,
                height: 300
            })
        );
        assert_eq!(normalize(WM_SIZE, SIZE_MINIMIZED, 0, (0, 0)), None);
    }

    #[test]
    fn mouse_coordinates_are_signed_words() {
        assert_eq!(
            normalize(WM_MOUSEMOVE, 0, lparam(-5, 20), (0, 0)),
            Some(Event::MouseMove { x: -5, y: 20 })
        );
        assert_eq!(
            normalize(WM_RBUTTONDOWN, 0, lparam(7, 9), (0, 0)),
            Some(Event::MouseButton {
                button: 3,
                pressed: true,
                x: 7,
                y: 9
            })
        );
        assert_eq!(
            normalize(WM_LBUTTONUP, 0, lparam(1, 2), (0, 0)),
            Some(Event::MouseButton {
                button: 1,
                pressed: false,
                x: 1,
                y: 2
            })
        );
    }

    #[test]
    fn keys_pass_virtual_key_through() {
        // VK_ESCAPE
        assert_eq!(
            normalize(WM_KEYDOWN, 0x1B, 0, (0, 0)),
            Some(Event::KeyDown { code: 0x1B })
        );
        assert_eq!(
            normalize(WM_SYSKEYUP, 0x12, 0, (0, 0)),
            Some(Event::KeyUp { code: 0x12 })
        );
    }

    #[test]
    fn mouse_leave_uses_last_pointer_position() {
        assert_eq!(
            normalize(WM_MOUSELEAVE, 0, 0, (31, 42)),
            Some(Event::MouseLeave { x: 31, y: 42 })
        );
    }

    #[test]
    fn other_messages_are_ignored() {
        // WM_SETCURSOR, WM_NCHITTEST
        assert_eq!(normalize(0x0020, 0, 0, (0, 0)), None);
        assert_eq!(normalize(0x0084, 0, 0, (0, 0)), None);
    }
}
