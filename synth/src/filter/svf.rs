use core::f32::consts::PI;

use crate::{clamp, sanitize_sample_rate, DEFAULT_SAMPLE_RATE};

use super::{FilterType, Processor, MIN_CUTOFF};

const MAX_CUTOFF_RATIO: f32 = 0.45;
const MIN_RESONANCE: f32 = 0.1;
const MAX_RESONANCE: f32 = 10.0;

// stable ranges for the derived coefficients
const MAX_F: f32 = 1.9;
const MIN_Q: f32 = 0.01;
const MAX_Q: f32 = 2.0;

/// Fraction of the stability limit on `f` that is actually used.
const STABILITY_MARGIN: f32 = 0.98;

/// State magnitudes below this are flushed to zero.
const DENORMAL_THRESHOLD: f32 = 1e-10;

/// Two-integrator (Chamberlin) state-variable filter.
///
/// One call to [`process`](Self::process) updates the low, band and high
/// outputs together; read them back with the accessors.
#[derive(Debug, Clone)]
pub struct StateVariable {
    low: f32,
    band: f32,
    high: f32,
    f: f32,
    q: f32,
    cutoff: f32,
    resonance: f32,
    sample_rate: f32,
    output: FilterType,
}

impl StateVariable {
    /// 1 kHz cutoff, resonance 0.7, low-pass output.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            low: 0.0,
            band: 0.0,
            high: 0.0,
            f: 0.0,
            q: 1.0,
            cutoff: 1000.0,
            resonance: 0.7,
            sample_rate: sanitize_sample_rate(sample_rate),
            output: FilterType::Lowpass,
        };
        filter.set_params(filter.cutoff, filter.resonance);
        filter
    }

    /// Set cutoff (Hz, clamped to [1, 0.45 · sample rate]) and resonance
    /// (clamped to [0.1, 10]) together.
    pub fn set_params(&mut self, cutoff: f32, resonance: f32) {
        self.cutoff = clamp(cutoff, MIN_CUTOFF, self.sample_rate * MAX_CUTOFF_RATIO);
        self.resonance = clamp(resonance, MIN_RESONANCE, MAX_RESONANCE);
        self.update_coefficients();
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.set_params(cutoff, self.resonance);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.set_params(self.cutoff, resonance);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.set_params(self.cutoff, self.resonance);
    }

    /// Select the output returned through [`Processor::process`].
    pub fn set_output(&mut self, output: FilterType) {
        self.output = output;
    }

    /// Run one sample through both integrators.
    #[inline]
    pub fn process(&mut self, input: f32) {
        self.low += self.f * self.band;
        self.high = input - self.low - self.q * self.band;
        self.band += self.f * self.high;

        flush_denormal(&mut self.low);
        flush_denormal(&mut self.band);
        flush_denormal(&mut self.high);
    }

    pub fn low(&self) -> f32 {
        self.low
    }

    pub fn high(&self) -> f32 {
        self.high
    }

    pub fn band(&self) -> f32 {
        self.band
    }

    pub fn notch(&self) -> f32 {
        self.low + self.high
    }

    pub fn output(&self, output: FilterType) -> f32 {
        match output {
            FilterType::Lowpass => self.low(),
            FilterType::Highpass => self.high(),
            FilterType::Bandpass => self.band(),
            FilterType::Notch => self.notch(),
        }
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    fn update_coefficients(&mut self) {
        let f = 2.0 * libm::sinf(PI * self.cutoff / self.sample_rate);
        let q = 1.0 / self.resonance;

        self.q = clamp(q, MIN_Q, MAX_Q);
        self.f = clamp(f, 0.0, max_stable_f(self.q));
    }
}

/// Largest `f` that keeps both poles inside the unit circle for damping `q`.
///
/// The loop is stable while `f² + 2fq < 4` (which also gives `fq < 2`), so
/// `f` has to stay below `sqrt(q² + 4) - q`.
fn max_stable_f(q: f32) -> f32 {
    let limit = libm::sqrtf(q * q + 4.0) - q;
    (limit * STABILITY_MARGIN).min(MAX_F)
}

#[inline]
fn flush_denormal(value: &mut f32) {
    if value.abs() < DENORMAL_THRESHOLD {
        *value = 0.0;
    }
}

impl Default for StateVariable {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE as f32)
    }
}

impl Processor for StateVariable {
    fn process(&mut self, input: f32) -> f32 {
        StateVariable::process(self, input);
        self.output(self.output)
    }

    fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
        self.high = 0.0;
    }
}
