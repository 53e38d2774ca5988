//! Phase accumulation with a double precision running phase.

use crate::{clamp, sanitize_sample_rate, DEFAULT_SAMPLE_RATE};

/// Running position through one waveform cycle, in [0, 1).
///
/// The phase and increment are kept as `f64` so the accumulated error stays
/// far below one sample even after hours of ticking; only the value handed out
/// by [`tick`](Self::tick) is reduced to `f32`.
///
/// Frequency is the durable quantity: the increment is always re-derived from
/// it, never set directly.
#[derive(Debug, Clone, Copy)]
pub struct PhaseAccumulator {
    phase: f64,
    increment: f64,
    frequency: f32,
    sample_rate: f32,
}

impl PhaseAccumulator {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            increment: 0.0,
            frequency: 0.0,
            sample_rate: sanitize_sample_rate(sample_rate),
        }
    }

    /// Set the frequency in Hz, clamped to [0, Nyquist].
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = clamp(frequency, 0.0, self.sample_rate * 0.5);
        self.increment = self.frequency as f64 / self.sample_rate as f64;
    }

    /// Change the sample rate while keeping the configured frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.set_frequency(self.frequency);
    }

    /// Advance by one sample and return the new phase.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        self.advance();
        self.phase()
    }

    /// Advance by one sample, returning `true` when the phase wrapped.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.phase += self.increment;
        // increment <= 0.5, so one subtraction always lands back in [0, 1)
        if self.phase >= 1.0 {
            self.phase -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current phase without advancing.
    #[inline]
    pub fn phase(&self) -> f32 {
        let phase = self.phase as f32;
        // a phase just below 1.0 can round up when narrowed
        if phase < 1.0 {
            phase
        } else {
            0.0
        }
    }

    /// Jump to `phase`, reduced into [0, 1). Non-finite input resets to 0.
    pub fn set_phase(&mut self, phase: f32) {
        let phase = phase as f64;
        let wrapped = phase - libm::floor(phase);
        self.phase = if wrapped.is_finite() && (0.0..1.0).contains(&wrapped) {
            wrapped
        } else {
            0.0
        };
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl Default for PhaseAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE as f32)
    }
}
