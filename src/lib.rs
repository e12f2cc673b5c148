pub mod bridge; // One-call wiring of mailbox, poller and consumer
pub mod config;
pub mod dsp; // Signal sources used by the bundled patches
pub mod error;
pub mod input; // Device polling and record decoding (poller thread)
pub mod mailbox;
pub mod rt; // Realtime consumer (audio thread)
pub mod shutdown;

pub use error::{Discard, InputError};
pub use input::{KeyKind, KeyTransition};

pub const MAX_BLOCK_SIZE: usize = 2048;
