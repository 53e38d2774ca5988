//! Control-rate generators: envelopes and the LFO.

pub mod adsr;
pub mod ar;
pub mod lfo;

pub use adsr::Adsr;
pub use ar::Ar;
pub use lfo::Lfo;

/// Per-sample step that covers `span` in `time` seconds.
#[inline]
pub(crate) fn increment(span: f32, time: f32, sample_rate: f32) -> f32 {
    span / (time * sample_rate)
}
