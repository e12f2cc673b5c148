//! Small signal sources for the bundled demo patches.
//!
//! These are allocation-free once constructed and safe to run inside the audio
//! callback. The key bridge does not depend on them.

/// Pitch and level conversions.
pub mod convert;
/// Wavetable oscillator.
pub mod oscillator;
/// One-shot buffer playback.
pub mod sampler;

pub use convert::{db_to_gain, midi_note_to_freq};
pub use oscillator::Wavetable;
pub use sampler::OneShot;
