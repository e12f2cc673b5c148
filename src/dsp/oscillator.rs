use std::f32::consts::TAU;

/*
Wavetable Oscillator
====================

One cycle of a waveform is computed once into a table. Playback walks the
table with a fractional read position and linearly interpolates between
neighbouring entries:

    increment = table_len * frequency / sample_rate

    pos:   0 ──────── 1 ──────── 2 ── ... ── len-1 ── (wraps to 0)
                ↑
            read_pos = 1.37  →  t[1] + 0.37 * (t[2] - t[1])

Changing the frequency only changes the increment, so pitch changes are
click-free and cost nothing per sample. The table is built at setup time;
nothing here allocates after construction.
*/

/// Table length used by the additive synth patch.
pub const DEFAULT_TABLE_SIZE: usize = 512;

/// One cycle of a sine wave.
pub fn sine_table(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| (TAU * n as f32 / len as f32).sin())
        .collect()
}

#[derive(Debug, Clone)]
pub struct Wavetable {
    table: Vec<f32>,
    sample_rate: f32,
    read_pos: f32,
    increment: f32,
}

impl Wavetable {
    pub fn new(sample_rate: f32, table: Vec<f32>) -> Self {
        assert!(!table.is_empty(), "wavetable needs at least one sample");
        Self {
            table,
            sample_rate,
            read_pos: 0.0,
            increment: 0.0,
        }
    }

    pub fn sine(sample_rate: f32) -> Self {
        Self::new(sample_rate, sine_table(DEFAULT_TABLE_SIZE))
    }

    /// Negative and non-finite frequencies are ignored. Anything above
    /// Nyquist is clamped to it, so one step never skips more than half the
    /// table.
    pub fn set_frequency(&mut self, frequency: f32) {
        if !frequency.is_finite() || frequency < 0.0 {
            return;
        }
        let frequency = frequency.min(self.sample_rate * 0.5);
        let increment = self.table.len() as f32 * frequency / self.sample_rate;
        if increment.is_finite() {
            self.increment = increment;
        }
    }

    pub fn frequency(&self) -> f32 {
        self.increment * self.sample_rate / self.table.len() as f32
    }

    pub fn reset(&mut self) {
        self.read_pos = 0.0;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let len = self.table.len();
        let index_below = self.read_pos as usize;
        let index_above = if index_below + 1 >= len { 0 } else { index_below + 1 };
        let frac = self.read_pos - index_below as f32;

        let out = self.table[index_below] + frac * (self.table[index_above] - self.table[index_below]);

        let next = (self.read_pos + self.increment).rem_euclid(len as f32);
        // rem_euclid can round up to exactly `len`.
        self.read_pos = if next.is_finite() && next < len as f32 {
            next
        } else {
            0.0
        };

        out
    }

    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let frequency = 440.0;
        let mut osc = Wavetable::new(sample_rate, sine_table(4096));
        osc.set_frequency(frequency);

        let mut buffer = vec![0.0f32; 128];
        osc.render(&mut buffer);

        // sample n should be sin(2pi f n / sr)
        let sample_index = 12;
        let expected = (TAU * frequency * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn frequency_round_trips_through_increment() {
        let mut osc = Wavetable::sine(44_100.0);
        osc.set_frequency(261.63);
        assert!((osc.frequency() - 261.63).abs() < 1e-2);
    }

    #[test]
    fn output_stays_bounded_over_many_cycles() {
        let mut osc = Wavetable::sine(48_000.0);
        osc.set_frequency(9_000.0);

        let mut buffer = vec![0.0f32; 48_000];
        osc.render(&mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn huge_frequency_is_clamped_to_nyquist() {
        let mut osc = Wavetable::sine(48_000.0);
        osc.set_frequency(1e30);
        assert!((osc.frequency() - 24_000.0).abs() < 1e-1);

        let mut buffer = vec![0.0f32; 4096];
        osc.render(&mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn invalid_frequencies_are_ignored() {
        let mut osc = Wavetable::sine(48_000.0);
        osc.set_frequency(440.0);

        for bad in [-440.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            osc.set_frequency(bad);
            assert!((osc.frequency() - 440.0).abs() < 1e-2);
        }

        let mut buffer = vec![0.0f32; 48_000];
        osc.render(&mut buffer);
        let peak = buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 1.0 + 1e-6, "peak {peak}");
    }
}
