use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures that stop or interrupt the input side of the bridge.
///
/// None of these ever reach the realtime consumer: it only sees well-formed
/// transitions or nothing.
#[derive(Debug, Error)]
pub enum InputError {
    /// The device node could not be opened (missing, unplugged, permissions).
    #[error("cannot open input device {}: {source}", path.display())]
    DeviceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Waiting on or reading from an open device failed.
    #[error("input device i/o failed: {0}")]
    Io(#[from] io::Error),

    /// The poller thread could not be started.
    #[error("failed to spawn input poller thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Why a raw record did not produce a transition.
///
/// Discards are expected traffic (sync reports, scan codes, auto-repeat), so
/// the poller only traces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Discard {
    #[error("short read: {got} of {expected} bytes")]
    ShortRead { got: usize, expected: usize },

    #[error("not a key event (type {ev_type})")]
    NotKeyEvent { ev_type: u16 },

    #[error("unrecognized key event value {0}")]
    UnrecognizedEventValue(i32),
}
