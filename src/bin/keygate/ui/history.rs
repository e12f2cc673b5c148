//! Trigger-aligned capture for the scope display.

use crate::patches::ScopeFrame;

/// Holds the last complete sweep and fills the next one.
///
/// A sweep starts on a trigger frame and ends after `width` frames. Frames
/// that arrive between sweeps are skipped until the next trigger, so every
/// displayed sweep starts at the same phase.
pub struct SweepHistory {
    width: usize,
    shown_signal: Vec<f32>,
    shown_gate: Vec<f32>,
    pending_signal: Vec<f32>,
    pending_gate: Vec<f32>,
    capturing: bool,
    sweeps: u64,
}

impl SweepHistory {
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            width,
            shown_signal: vec![0.0; width],
            shown_gate: vec![0.0; width],
            pending_signal: Vec::with_capacity(width),
            pending_gate: Vec::with_capacity(width),
            capturing: false,
            sweeps: 0,
        }
    }

    pub fn push(&mut self, frame: ScopeFrame) {
        if !self.capturing {
            if !frame.trigger {
                return;
            }
            self.capturing = true;
        }

        self.pending_signal.push(frame.signal);
        self.pending_gate.push(frame.gate);

        if self.pending_signal.len() == self.width {
            std::mem::swap(&mut self.shown_signal, &mut self.pending_signal);
            std::mem::swap(&mut self.shown_gate, &mut self.pending_gate);
            self.pending_signal.clear();
            self.pending_gate.clear();
            self.capturing = false;
            self.sweeps += 1;
        }
    }

    pub fn signal(&self) -> &[f32] {
        &self.shown_signal
    }

    pub fn gate(&self) -> &[f32] {
        &self.shown_gate
    }

    /// Completed sweeps since creation.
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }
}
