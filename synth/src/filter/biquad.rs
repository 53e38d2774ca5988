use core::f32::consts::{LN_2, PI};

use crate::{clamp, sanitize_sample_rate, DEFAULT_SAMPLE_RATE};

use super::{FilterType, Processor, MIN_CUTOFF};

/// A simple Biquad filter.
///
/// Direct form I, `a0` normalized to 1:
///
/// ```text
/// y[n] = b0·x[n] + b1·x[n-1] + b2·x[n-2] - a1·y[n-1] - a2·y[n-2]
/// ```
///
/// Prototype responses follow the RBJ audio EQ cookbook at a Butterworth Q.
/// For a complete explanation see
/// http://www.earlevel.com/main/2012/11/26/biquad-c-source-code/
#[derive(Debug, Clone)]
pub struct Biquad {
    design: Design,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    sample_rate: f32,
}

/// Quality factor used by the low-pass, high-pass and notch prototypes.
pub const BUTTERWORTH_Q: f32 = 0.7071;

/// Default band-pass width, in octaves.
pub const DEFAULT_BANDWIDTH: f32 = 1.0;

const MAX_CUTOFF_RATIO: f32 = 0.49;
const MIN_BANDWIDTH: f32 = 0.01;
const MAX_BANDWIDTH: f32 = 4.0;

/// Poles are kept this far inside the unit circle.
const STABILITY_MARGIN: f32 = 0.9999;

/// What the current coefficients were derived from, so a sample rate change
/// can derive them again.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Design {
    Direct,
    Lowpass { cutoff: f32 },
    Highpass { cutoff: f32 },
    Bandpass { center: f32, bandwidth: f32 },
    Notch { center: f32 },
}

impl Biquad {
    /// A prototype response at `cutoff` Hz. Band-pass uses a one octave width.
    pub fn new(r#type: FilterType, cutoff: f32, sample_rate: f32) -> Self {
        let mut filter = Self::passthrough(sample_rate);
        match r#type {
            FilterType::Lowpass => filter.set_lowpass(cutoff),
            FilterType::Highpass => filter.set_highpass(cutoff),
            FilterType::Bandpass => filter.set_bandpass(cutoff, DEFAULT_BANDWIDTH),
            FilterType::Notch => filter.set_notch(cutoff),
        }
        filter
    }

    /// Unity gain, no filtering.
    pub fn passthrough(sample_rate: f32) -> Self {
        Self {
            design: Design::Direct,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            sample_rate: sanitize_sample_rate(sample_rate),
        }
    }

    /// Set the five coefficients directly (`a0` is taken as 1).
    ///
    /// Non-finite values are zeroed and the feedback pair is pulled into the
    /// stability triangle `|a2| < 1, |a1| < 1 + a2`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };

        let a2 = clamp(finite(a2), -STABILITY_MARGIN, STABILITY_MARGIN);
        let limit = (1.0 + a2) * STABILITY_MARGIN;

        self.b0 = finite(b0);
        self.b1 = finite(b1);
        self.b2 = finite(b2);
        self.a1 = clamp(finite(a1), -limit, limit);
        self.a2 = a2;
        self.design = Design::Direct;
    }

    pub fn set_lowpass(&mut self, cutoff: f32) {
        self.design = Design::Lowpass {
            cutoff: self.clamp_frequency(cutoff),
        };
        self.update_coefficients();
    }

    pub fn set_highpass(&mut self, cutoff: f32) {
        self.design = Design::Highpass {
            cutoff: self.clamp_frequency(cutoff),
        };
        self.update_coefficients();
    }

    /// Constant 0 dB peak band-pass around `center`, `bandwidth` in octaves.
    pub fn set_bandpass(&mut self, center: f32, bandwidth: f32) {
        self.design = Design::Bandpass {
            center: self.clamp_frequency(center),
            bandwidth: clamp(bandwidth, MIN_BANDWIDTH, MAX_BANDWIDTH),
        };
        self.update_coefficients();
    }

    pub fn set_notch(&mut self, center: f32) {
        self.design = Design::Notch {
            center: self.clamp_frequency(center),
        };
        self.update_coefficients();
    }

    /// Change the sample rate and re-derive the current prototype. Directly
    /// set coefficients are kept as they are.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        match self.design {
            Design::Direct => {}
            Design::Lowpass { cutoff } => self.set_lowpass(cutoff),
            Design::Highpass { cutoff } => self.set_highpass(cutoff),
            Design::Bandpass { center, bandwidth } => self.set_bandpass(center, bandwidth),
            Design::Notch { center } => self.set_notch(center),
        }
    }

    /// Apply the filter to the sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// `(b0, b1, b2, a1, a2)`
    pub fn coefficients(&self) -> (f32, f32, f32, f32, f32) {
        (self.b0, self.b1, self.b2, self.a1, self.a2)
    }

    /// Cutoff or center frequency of the current prototype, `None` for
    /// directly set coefficients.
    pub fn frequency(&self) -> Option<f32> {
        match self.design {
            Design::Direct => None,
            Design::Lowpass { cutoff } | Design::Highpass { cutoff } => Some(cutoff),
            Design::Bandpass { center, .. } | Design::Notch { center } => Some(center),
        }
    }

    fn clamp_frequency(&self, frequency: f32) -> f32 {
        clamp(frequency, MIN_CUTOFF, self.sample_rate * MAX_CUTOFF_RATIO)
    }

    fn update_coefficients(&mut self) {
        let frequency = match self.frequency() {
            Some(f) => f,
            None => return,
        };

        let omega = 2.0 * PI * frequency / self.sample_rate;
        let sin_omega = libm::sinf(omega);
        let cos_omega = libm::cosf(omega);

        let alpha = match self.design {
            Design::Bandpass { bandwidth, .. } => {
                sin_omega * libm::sinhf(LN_2 / 2.0 * bandwidth * omega / sin_omega)
            }
            _ => sin_omega / (2.0 * BUTTERWORTH_Q),
        };

        let a0 = 1.0 + alpha;
        let (b0, b1, b2) = match self.design {
            Design::Lowpass { .. } => {
                let b = (1.0 - cos_omega) / a0;
                (b / 2.0, b, b / 2.0)
            }
            Design::Highpass { .. } => {
                let b = (1.0 + cos_omega) / a0;
                (b / 2.0, -b, b / 2.0)
            }
            Design::Bandpass { .. } => (alpha / a0, 0.0, -alpha / a0),
            Design::Notch { .. } => (1.0 / a0, -2.0 * cos_omega / a0, 1.0 / a0),
            Design::Direct => return,
        };

        self.b0 = b0;
        self.b1 = b1;
        self.b2 = b2;
        self.a1 = -2.0 * cos_omega / a0;
        self.a2 = (1.0 - alpha) / a0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::passthrough(DEFAULT_SAMPLE_RATE as f32)
    }
}

impl Processor for Biquad {
    fn process(&mut self, input: f32) -> f32 {
        Biquad::process(self, input)
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Peak output magnitude of a sine at `freq` after the transient.
    fn sine_gain(filter: &mut Biquad, freq: f32, sample_rate: f32) -> f32 {
        let mut peak = 0.0f32;
        for n in 0..(sample_rate as usize) {
            let x = libm::sinf(2.0 * PI * freq * n as f32 / sample_rate);
            let y = filter.process(x);
            if n > sample_rate as usize / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn passthrough_is_identity() {
        let mut filter = Biquad::default();
        for x in [0.5, -0.25, 1.0, 0.0] {
            assert_eq!(filter.process(x), x);
        }
    }

    #[test]
    fn lowpass_has_unity_dc_gain() {
        let mut filter = Biquad::new(FilterType::Lowpass, 1000.0, 48_000.0);
        let mut out = 0.0;
        for _ in 0..5_000 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-3);
    }

    #[test]
    fn lowpass_attenuates_above_cutoff() {
        let mut filter = Biquad::new(FilterType::Lowpass, 500.0, 48_000.0);
        let gain = sine_gain(&mut filter, 5_000.0, 48_000.0);
        // two poles, a bit over three octaves above cutoff
        assert!(gain < 0.02, "gain {gain}");
    }

    #[test]
    fn highpass_rejects_dc() {
        let mut filter = Biquad::new(FilterType::Highpass, 1000.0, 48_000.0);
        let mut out = 1.0;
        for _ in 0..5_000 {
            out = filter.process(1.0);
        }
        assert!(out.abs() < 1e-3);
    }

    #[test]
    fn bandpass_peaks_at_center() {
        let mut filter = Biquad::new(FilterType::Bandpass, 1000.0, 48_000.0);
        let center = sine_gain(&mut filter, 1000.0, 48_000.0);
        filter.reset();
        let off = sine_gain(&mut filter, 8000.0, 48_000.0);
        assert!((center - 1.0).abs() < 0.02, "center {center}");
        assert!(off < 0.3, "off {off}");
    }

    #[test]
    fn notch_removes_center() {
        let mut filter = Biquad::new(FilterType::Notch, 1000.0, 48_000.0);
        let gain = sine_gain(&mut filter, 1000.0, 48_000.0);
        assert!(gain < 0.01, "gain {gain}");
    }

    #[test]
    fn cutoff_is_clamped() {
        let mut filter = Biquad::passthrough(10_000.0);
        filter.set_lowpass(1.0e9);
        assert_eq!(filter.frequency(), Some(10_000.0 * 0.49));
        filter.set_highpass(f32::NAN);
        assert_eq!(filter.frequency(), Some(1.0));
    }

    #[test]
    fn direct_coefficients_are_made_stable() {
        let mut filter = Biquad::default();
        filter.set_coefficients(1.0, 0.0, 0.0, -3.0, 2.0);
        let (_, _, _, a1, a2) = filter.coefficients();
        assert!(a2.abs() < 1.0);
        assert!(a1.abs() < 1.0 + a2);

        filter.set_coefficients(f32::NAN, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(filter.coefficients().0, 0.0);
        assert_eq!(filter.frequency(), None);
    }

    #[test]
    fn sample_rate_change_rederives_prototype() {
        let mut a = Biquad::new(FilterType::Lowpass, 1000.0, 48_000.0);
        a.set_sample_rate(22_050.0);
        let b = Biquad::new(FilterType::Lowpass, 1000.0, 22_050.0);
        assert_eq!(a.coefficients(), b.coefficients());
    }

    #[test]
    fn reset_clears_history_only() {
        let mut filter = Biquad::new(FilterType::Lowpass, 1000.0, 48_000.0);
        let coefficients = filter.coefficients();
        let first = filter.process(1.0);
        filter.process(1.0);
        filter.reset();
        assert_eq!(filter.coefficients(), coefficients);
        assert_eq!(filter.process(1.0), first);
    }
}
