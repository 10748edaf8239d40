//! Portable window events and the event classes a window registers for.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A read-only snapshot of one native event.
///
/// Coordinates are window-client-relative pixels with the origin at the top
/// left. Key codes are the platform's raw key code. Buttons follow the X11
/// numbering everywhere: 1 left, 2 middle, 3 right, 4/5 wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Part of the window must be redrawn.
    Expose,
    Resize { width: u32, height: u32 },
    KeyDown { code: u32 },
    KeyUp { code: u32 },
    MouseMove { x: i32, y: i32 },
    MouseButton { button: u8, pressed: bool, x: i32, y: i32 },
    MouseEnter { x: i32, y: i32 },
    MouseLeave { x: i32, y: i32 },
    /// The window was closed by the user or destroyed.
    Close,
}

impl Event {
    /// The class this event belongs to.
    pub fn class(&self) -> EventMask {
        match self {
            Event::Expose => EventMask::EXPOSE,
            Event::Resize { .. } => EventMask::RESIZE,
            Event::KeyDown { .. } | Event::KeyUp { .. } => EventMask::KEY,
            Event::MouseMove { .. } => EventMask::POINTER_MOTION,
            Event::MouseEnter { .. } | Event::MouseLeave { .. } => EventMask::POINTER_CROSSING,
            Event::MouseButton { .. } => EventMask::BUTTON,
            Event::Close => EventMask::CLOSE,
        }
    }
}

bitflags! {
    /// Event classes a window registers for at open time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EventMask: u32 {
        const EXPOSE           = 1 << 0;
        const RESIZE           = 1 << 1;
        const KEY              = 1 << 2;
        const POINTER_MOTION   = 1 << 3;
        const POINTER_CROSSING = 1 << 4;
        const BUTTON           = 1 << 5;
        const CLOSE            = 1 << 6;
    }
}

impl Default for EventMask {
    fn default() -> Self {
        EventMask::all()
    }
}

impl EventMask {
    /// Whether `event` belongs to a registered class.
    pub fn admits(&self, event: &Event) -> bool {
        self.contains(event.class())
    }

    /// The mask actually registered with the window system.
    ///
    /// Close is always registered: without it the backend could never leave
    /// the running state on its own.
    pub fn registered(self) -> Self {
        self | EventMask::CLOSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_maps_to_a_single_class() {
        let events = [
            Event::Expose,
            Event::Resize { width: 1, height: 1 },
            Event::KeyDown { code: 38 },
            Event::KeyUp { code: 38 },
            Event::MouseMove { x: 0, y: 0 },
            Event::MouseButton { button: 1, pressed: true, x: 0, y: 0 },
            Event::MouseEnter { x: 0, y: 0 },
            Event::MouseLeave { x: 0, y: 0 },
            Event::Close,
        ];
        for event in events {
            assert_eq!(event.class().bits().count_ones(), 1, "{:?}", event);
            assert!(EventMask::all().admits(&event));
        }
    }

    #[test]
    fn unregistered_classes_are_not_admitted() {
        let mask = EventMask::EXPOSE | EventMask::RESIZE;
        assert!(mask.admits(&Event::Expose));
        assert!(!mask.admits(&Event::KeyDown { code: 9 }));
        assert!(!mask.admits(&Event::MouseMove { x: 1, y: 2 }));
    }

    #[test]
    fn close_is_always_registered() {
        assert!(EventMask::EXPOSE.registered().contains(EventMask::CLOSE));
        assert!(EventMask::empty().registered().admits(&Event::Close));
    }

    #[test]
    fn mask_round_trips_through_config_text() {
        let mask = EventMask::EXPOSE | EventMask::KEY;
        let text = serde_json::to_string(&mask).unwrap();
        let back: EventMask = serde_json::from_str(&text).unwrap();
        assert_eq!(back, mask);
    }
}
