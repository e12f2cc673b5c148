//! The demo instruments. Each one is a key map plus a block renderer.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use keygate::{
    dsp::{db_to_gain, midi_note_to_freq, OneShot, Wavetable},
    input::keys::{KEY_A, KEY_B, KEY_C, KEY_D, KEY_E, KEY_F},
    rt::{GateBank, KeyHandler, KeyMap},
    KeyKind,
};
use rtrb::Producer;

/// A sound that reacts to mapped key edges.
///
/// `on_key` and `render` run on the audio thread: no locks, no allocation.
pub trait Patch: Send + 'static {
    type Action: Send + 'static;

    fn key_map(&self) -> KeyMap<Self::Action>;

    fn on_key(&mut self, action: &Self::Action, kind: KeyKind);

    fn render(&mut self, out: &mut [f32]);
}

// -------------------- Sample --------------------

/// Any key press plays the sample from the start. Releases are ignored.
pub struct SamplePatch {
    shot: OneShot,
}

impl SamplePatch {
    pub fn new(sample_rate: f32, length_ms: u32) -> Self {
        Self {
            shot: OneShot::mono(pluck(sample_rate, length_ms)),
        }
    }
}

/// Decaying two-partial tone standing in for a recorded sample.
fn pluck(sample_rate: f32, length_ms: u32) -> Vec<f32> {
    let frames = (sample_rate * length_ms as f32 / 1000.0) as usize;
    (0..frames)
        .map(|n| {
            let t = n as f32 / sample_rate;
            let tone = (TAU * 220.0 * t).sin() + 0.5 * (TAU * 440.0 * t).sin();
            0.5 * tone * (-4.0 * t).exp()
        })
        .collect()
}

impl Patch for SamplePatch {
    type Action = ();

    fn key_map(&self) -> KeyMap<()> {
        KeyMap::any(())
    }

    fn on_key(&mut self, _action: &(), kind: KeyKind) {
        if kind == KeyKind::Pressed {
            self.shot.trigger();
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        self.shot.render(out);
    }
}

// -------------------- Tone --------------------

/// A sine that sounds while any key is held.
pub struct TonePatch {
    osc: Wavetable,
    sounding: bool,
}

const TONE_LEVEL: f32 = 0.5;

impl TonePatch {
    pub fn new(sample_rate: f32, frequency: f32) -> Self {
        let mut osc = Wavetable::sine(sample_rate);
        osc.set_frequency(frequency);
        Self {
            osc,
            sounding: false,
        }
    }
}

impl Patch for TonePatch {
    type Action = ();

    fn key_map(&self) -> KeyMap<()> {
        KeyMap::any(())
    }

    fn on_key(&mut self, _action: &(), kind: KeyKind) {
        self.sounding = kind == KeyKind::Pressed;
    }

    fn render(&mut self, out: &mut [f32]) {
        if !self.sounding {
            out.fill(0.0);
            return;
        }
        self.osc.render(out);
        for sample in out.iter_mut() {
            *sample *= TONE_LEVEL;
        }
    }
}

// -------------------- Additive --------------------

/// Keys bound to the additive oscillators, in oscillator order.
pub const ADDITIVE_KEYS: [u16; 6] = [KEY_A, KEY_B, KEY_C, KEY_D, KEY_E, KEY_F];
pub const DEFAULT_NOTES: [u8; 6] = [60, 62, 64, 65, 67, 69];
pub const MIN_NOTE: u8 = 48;
pub const MAX_NOTE: u8 = 84;
pub const MIN_GAIN_DB: f32 = -40.0;
pub const MAX_GAIN_DB: f32 = 0.0;

/// Six sine partials, each gated by its own key. With a scope attached the
/// summed output is logged too.
pub struct AdditivePatch {
    oscillators: Vec<Wavetable>,
    gates: GateBank,
    gain: f32,
    last_out: f32,
    frames_tx: Option<Producer<ScopeFrame>>,
}

impl AdditivePatch {
    pub fn new(sample_rate: f32, notes: &[u8], gain_db: f32) -> Self {
        let oscillators: Vec<Wavetable> = notes
            .iter()
            .take(ADDITIVE_KEYS.len())
            .map(|&note| {
                let note = note.clamp(MIN_NOTE, MAX_NOTE);
                let mut osc = Wavetable::sine(sample_rate);
                osc.set_frequency(midi_note_to_freq(note as f32));
                osc
            })
            .collect();
        let gates = GateBank::new(oscillators.len());

        Self {
            oscillators,
            gates,
            gain: db_to_gain(gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)),
            last_out: 0.0,
            frames_tx: None,
        }
    }

    pub fn with_scope(mut self, frames_tx: Producer<ScopeFrame>) -> Self {
        self.frames_tx = Some(frames_tx);
        self
    }

    pub fn gates(&self) -> &GateBank {
        &self.gates
    }
}

impl Patch for AdditivePatch {
    type Action = usize;

    fn key_map(&self) -> KeyMap<usize> {
        ADDITIVE_KEYS
            .iter()
            .copied()
            .zip(0..self.oscillators.len())
            .collect()
    }

    fn on_key(&mut self, channel: &usize, kind: KeyKind) {
        self.gates.on_key(channel, kind);
    }

    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            let mut sum = 0.0;
            // Closed partials are not advanced, matching a bank of muted voices.
            for (osc, open) in self.oscillators.iter_mut().zip(self.gates.iter()) {
                if open {
                    sum += osc.next_sample();
                }
            }
            let out = sum * self.gain;

            if let Some(frames_tx) = &mut self.frames_tx {
                // Trigger on upward zero crossings.
                let trigger = self.last_out < 0.0 && out >= 0.0;
                let gate = if self.gates.open_count() > 0 {
                    SCOPE_LEVEL
                } else {
                    0.0
                };
                let _ = frames_tx.push(ScopeFrame {
                    signal: out,
                    gate,
                    trigger,
                });
            }
            self.last_out = out;

            *sample = out;
        }
    }
}

// -------------------- Scope --------------------

/// One logged scope frame: the signal, the key-driven gate trace, and whether
/// the display should trigger here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScopeFrame {
    pub signal: f32,
    pub gate: f32,
    pub trigger: bool,
}

const SCOPE_FREQUENCY: f32 = 110.0;
const SCOPE_LEVEL: f32 = 0.8;

/// A quadrature oscillator pair logged to the terminal scope, with the key
/// gate drawn as a second trace. The audio output stays silent.
pub struct ScopePatch {
    phase: f32,
    phase_step: f32,
    gate_level: f32,
    last_out: f32,
    last_out2: f32,
    frames_tx: Producer<ScopeFrame>,
}

impl ScopePatch {
    pub fn new(sample_rate: f32, frames_tx: Producer<ScopeFrame>) -> Self {
        Self {
            phase: 0.0,
            phase_step: TAU * SCOPE_FREQUENCY / sample_rate,
            gate_level: 0.0,
            last_out: 0.0,
            last_out2: 0.0,
            frames_tx,
        }
    }
}

impl Patch for ScopePatch {
    type Action = ();

    fn key_map(&self) -> KeyMap<()> {
        KeyMap::any(())
    }

    fn on_key(&mut self, _action: &(), kind: KeyKind) {
        self.gate_level = match kind {
            KeyKind::Pressed => SCOPE_LEVEL,
            KeyKind::Released => 0.0,
        };
    }

    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            let out1 = SCOPE_LEVEL * self.phase.sin();
            let out2 = SCOPE_LEVEL * (self.phase - FRAC_PI_2).sin();

            self.phase += self.phase_step;
            if self.phase > PI {
                self.phase -= TAU;
            }

            // Trigger when oscillator 1 drops below oscillator 2.
            let trigger = self.last_out >= self.last_out2 && out1 < out2;
            self.last_out = out1;
            self.last_out2 = out2;

            // Drop frames if the UI falls behind.
            let _ = self.frames_tx.push(ScopeFrame {
                signal: out1,
                gate: self.gate_level,
                trigger,
            });

            *sample = 0.0;
        }
    }
}
