//! Native event records to portable [`Event`](super::events::Event)s.
//!
//! One pure function per window system. They operate on plain records the
//! drivers copy out of the native event structures, so every mapping is
//! compiled and tested on every host regardless of which driver is built.
//! Records of classes with no portable counterpart map to `None`.

pub mod cocoa;
pub mod win32;
pub mod x11;
