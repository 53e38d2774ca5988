use core::f32::consts::PI;

use crate::{clamp, sanitize_sample_rate, DEFAULT_SAMPLE_RATE};

use super::{FilterType, Processor, MIN_CUTOFF};

/// Highest cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.49;

/// First-order IIR filter.
///
/// The high-pass output is the input minus the low-pass output, so the two
/// responses are complementary and always sum back to the input.
#[derive(Debug, Clone)]
pub struct OnePole {
    y1: f32,
    a0: f32,
    b1: f32,
    cutoff: f32,
    sample_rate: f32,
    response: FilterType,
}

impl OnePole {
    /// Low-pass at 1 kHz.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            y1: 0.0,
            a0: 1.0,
            b1: 0.0,
            cutoff: 1000.0,
            sample_rate: sanitize_sample_rate(sample_rate),
            response: FilterType::Lowpass,
        };
        filter.set_cutoff(filter.cutoff);
        filter
    }

    /// Pick which output [`Processor::process`] returns. A one-pole has no
    /// band-pass or notch, those fall back to low-pass.
    pub fn set_response(&mut self, response: FilterType) {
        self.response = match response {
            FilterType::Highpass => FilterType::Highpass,
            _ => FilterType::Lowpass,
        };
    }

    /// Set the cutoff in Hz, clamped to [1, 0.49 · sample rate].
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff = clamp(cutoff, MIN_CUTOFF, self.sample_rate * MAX_CUTOFF_RATIO);
        self.update_coefficients();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.set_cutoff(self.cutoff);
    }

    #[inline]
    pub fn process_lowpass(&mut self, input: f32) -> f32 {
        self.y1 = self.a0 * input + self.b1 * self.y1;
        self.y1
    }

    #[inline]
    pub fn process_highpass(&mut self, input: f32) -> f32 {
        input - self.process_lowpass(input)
    }

    /// Both outputs for one input sample, `(low, high)`.
    #[inline]
    pub fn process_split(&mut self, input: f32) -> (f32, f32) {
        let low = self.process_lowpass(input);
        (low, input - low)
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn response(&self) -> FilterType {
        self.response
    }

    fn update_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let alpha = 1.0 - libm::expf(-omega);
        self.a0 = alpha;
        self.b1 = 1.0 - alpha;
    }
}

impl Default for OnePole {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE as f32)
    }
}

impl Processor for OnePole {
    fn process(&mut self, input: f32) -> f32 {
        match self.response {
            FilterType::Highpass => self.process_highpass(input),
            _ => self.process_lowpass(input),
        }
    }

    fn reset(&mut self) {
        self.y1 = 0.0;
    }
}
