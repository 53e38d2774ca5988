//! The basic waveform bank: sine, saw, square, triangle, soft saw and pulse.
//!
//! Tables are computed once at start-up (there is no `const` trigonometry to
//! do it at compile time) and must exist before the sample clock is started.

use core::{f32::consts::PI, str::FromStr};

use crate::wavetable::{Wavetable, WavetableBank};

/// Number of tables in a [`BasicBank`].
pub const BASIC_WAVEFORMS: usize = 6;

/// Harmonics summed into the band-limited soft saw.
const SOFT_SAW_HARMONICS: usize = 8;

/// Identifier of one of the basic tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    Sine = 0,
    Saw = 1,
    Square = 2,
    Triangle = 3,
    SoftSaw = 4,
    Pulse = 5,
}

impl Waveform {
    pub const ALL: [Waveform; BASIC_WAVEFORMS] = [
        Waveform::Sine,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::SoftSaw,
        Waveform::Pulse,
    ];

    /// Waveform for a bank index, wrapping out-of-range values.
    pub fn from_index(index: u8) -> Self {
        Self::ALL[index as usize % BASIC_WAVEFORMS]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Saw => "saw",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::SoftSaw => "soft-saw",
            Waveform::Pulse => "pulse",
        }
    }

    /// Value of the waveform at `i` out of `n` table positions.
    pub fn evaluate(self, i: usize, n: usize) -> f32 {
        let x = i as f32 / n as f32;

        match self {
            Waveform::Sine => libm::sinf(2.0 * PI * x),
            Waveform::Saw => 2.0 * i as f32 / (n.max(2) - 1) as f32 - 1.0,
            Waveform::Square => {
                if i < n / 2 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                if i < n / 2 {
                    4.0 * x - 1.0
                } else {
                    3.0 - 4.0 * x
                }
            }
            Waveform::SoftSaw => {
                let phase = 2.0 * PI * x;
                let sum: f32 = (1..=SOFT_SAW_HARMONICS)
                    .map(|h| libm::sinf(h as f32 * phase) / h as f32)
                    .sum();
                // keeps the Gibbs overshoot inside full scale
                sum * 0.3
            }
            Waveform::Pulse => {
                if i < n / 4 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    /// Compute the table for this waveform.
    pub fn table<const N: usize>(self) -> Wavetable<N> {
        Wavetable::from_fn(|i| self.evaluate(i, N))
    }
}

/// Error returned when parsing an unknown waveform name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown waveform name (expected sine, saw, square, triangle, soft-saw or pulse)")]
pub struct UnknownWaveform;

impl FromStr for Waveform {
    type Err = UnknownWaveform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s))
            .ok_or(UnknownWaveform)
    }
}

/// The six basic tables, indexed by [`Waveform`].
pub type BasicBank<const N: usize> = WavetableBank<BASIC_WAVEFORMS, N>;

impl<const N: usize> WavetableBank<BASIC_WAVEFORMS, N> {
    /// Generate every basic table.
    pub fn basic() -> Self {
        Self::new(Waveform::ALL.map(|w| w.table::<N>()))
    }

    pub fn wave(&self, waveform: Waveform) -> &Wavetable<N> {
        self.get(waveform.index())
    }
}
