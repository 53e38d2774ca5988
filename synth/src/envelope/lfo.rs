use core::f32::consts::PI;

use crate::{clamp, phase::PhaseAccumulator, rng::XorShift32, DEFAULT_SAMPLE_RATE};

const MIN_FREQUENCY: f32 = 0.001;
const MAX_FREQUENCY: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shape {
    Sine,
    Triangle,
    Sawtooth,
    Square,
    /// New random value at each phase wrap, held until the next.
    SampleHold,
    /// New random value every sample.
    Noise,
}

/// Free-running low frequency oscillator.
///
/// Output is `shape(phase) · amplitude + offset`, where the shape is computed
/// from the phase before it advances.
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: PhaseAccumulator,
    shape: Shape,
    amplitude: f32,
    offset: f32,
    held: f32,
    capture: bool,
    rng: XorShift32,
}

impl Lfo {
    /// 1 Hz sine, full amplitude, no offset.
    pub fn new(sample_rate: f32) -> Self {
        let mut lfo = Self {
            phase: PhaseAccumulator::new(sample_rate),
            shape: Shape::Sine,
            amplitude: 1.0,
            offset: 0.0,
            held: 0.0,
            capture: true,
            rng: XorShift32::default(),
        };
        lfo.set_frequency(1.0);
        lfo
    }

    /// Frequency in Hz, clamped to [0.001, 100].
    pub fn set_frequency(&mut self, frequency: f32) {
        self.phase
            .set_frequency(clamp(frequency, MIN_FREQUENCY, MAX_FREQUENCY));
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = clamp(amplitude, 0.0, 1.0);
    }

    pub fn set_offset(&mut self, offset: f32) {
        self.offset = clamp(offset, -1.0, 1.0);
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.phase.set_sample_rate(sample_rate);
    }

    /// Restart the random stream. Zero is replaced by the default seed.
    pub fn seed(&mut self, seed: u32) {
        self.rng.reseed(seed);
    }

    pub fn process(&mut self) -> f32 {
        let phase = self.phase.phase();

        let output = match self.shape {
            Shape::Sine => libm::sinf(2.0 * PI * phase),
            Shape::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            Shape::Sawtooth => 2.0 * phase - 1.0,
            Shape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Shape::SampleHold => {
                if self.capture {
                    self.held = self.rng.next_bipolar();
                }
                self.held
            }
            Shape::Noise => self.rng.next_bipolar(),
        };

        self.capture = self.phase.advance();

        output * self.amplitude + self.offset
    }

    /// Back to phase 0. The next sample-and-hold output draws a fresh value.
    pub fn reset(&mut self) {
        self.phase.reset();
        self.held = 0.0;
        self.capture = true;
    }

    pub fn frequency(&self) -> f32 {
        self.phase.frequency()
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn phase(&self) -> f32 {
        self.phase.phase()
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE as f32)
    }
}
