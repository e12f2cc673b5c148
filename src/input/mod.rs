//! Keyboard input capture.
//!
//! Everything in here runs on the poller thread: opening the evdev node,
//! waiting for records with a short timeout, decoding them into
//! [`KeyTransition`]s and publishing those into the mailbox. Nothing in this
//! module is safe to call from the audio callback.

/// Opening and waiting on evdev device nodes.
pub mod device;
/// Raw `input_event` record layout and decoding.
pub mod event;
/// Linux key code constants used by key maps.
pub mod keys;
/// The background poll loop and its scheduling modes.
pub mod poller;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of a key edge.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Pressed,
    Released,
}

/// One discrete press or release of a physical key.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyTransition {
    /// Device keycode (`KEY_*` from `input-event-codes.h`).
    pub code: u16,
    pub kind: KeyKind,
}

impl KeyTransition {
    pub const fn pressed(code: u16) -> Self {
        Self {
            code,
            kind: KeyKind::Pressed,
        }
    }

    pub const fn released(code: u16) -> Self {
        Self {
            code,
            kind: KeyKind::Released,
        }
    }

    pub fn is_press(&self) -> bool {
        self.kind == KeyKind::Pressed
    }
}
