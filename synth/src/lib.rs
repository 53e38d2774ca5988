#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod engine;
pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod param;
pub mod phase;
pub mod rng;
pub mod voice;
pub mod waveforms;
pub mod wavetable;

pub use engine::{ClockState, Error, SampleClock, SampleSource, Timer, Transport};
pub use envelope::{Adsr, Ar, Lfo};
pub use filter::{Biquad, DcBlocker, FilterType, OnePole, Processor, StateVariable};
pub use oscillator::{NoiseGenerator, Oscillator, WavetableOscillator};
pub use param::SharedParam;
pub use phase::PhaseAccumulator;
pub use voice::{ControlledVoice, Voice, VoiceControls};
pub use waveforms::{BasicBank, Waveform};
pub use wavetable::{Wavetable, WavetableBank};

/// Sample rate used when nothing else is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Number of samples in one cycle of the built-in wavetables.
pub const TABLE_SIZE: usize = 1024;

/// Shortest envelope stage, in seconds.
pub const MIN_TIME: f32 = 0.001;

/// Sample rates below this are treated as this value by the DSP components.
pub(crate) const MIN_SAMPLE_RATE: f32 = 100.0;

/// Clamp that never panics: NaN maps to `min`, and an inverted range resolves
/// to `min`.
#[inline]
pub(crate) fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

#[inline]
pub(crate) fn sanitize_sample_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() && sample_rate > MIN_SAMPLE_RATE {
        sample_rate
    } else {
        MIN_SAMPLE_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_nan_and_inverted_ranges() {
        assert_eq!(clamp(f32::NAN, 1.0, 2.0), 1.0);
        assert_eq!(clamp(5.0, 1.0, 2.0), 2.0);
        assert_eq!(clamp(-5.0, 1.0, 2.0), 1.0);
        assert_eq!(clamp(1.5, 1.0, 2.0), 1.5);
        assert_eq!(clamp(1.5, 3.0, 2.0), 3.0);
    }

    #[test]
    fn sample_rate_is_floored() {
        assert_eq!(sanitize_sample_rate(0.0), MIN_SAMPLE_RATE);
        assert_eq!(sanitize_sample_rate(f32::INFINITY), MIN_SAMPLE_RATE);
        assert_eq!(sanitize_sample_rate(48_000.0), 48_000.0);
    }
}
