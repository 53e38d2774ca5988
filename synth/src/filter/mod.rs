//! Single-input, single-output filters.
//!
//! Every setter clamps its input into a range known to give stable
//! coefficients before deriving them, so no parameter value can make a filter
//! blow up. `reset` clears history and leaves coefficients alone.

pub mod biquad;
pub mod dc_blocker;
pub mod one_pole;
pub mod svf;

pub use biquad::Biquad;
pub use dc_blocker::DcBlocker;
pub use one_pole::OnePole;
pub use svf::StateVariable;

/// The response a filter is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

/// A per-sample transform, so filters can be chained generically.
pub trait Processor {
    /// Filter one sample.
    fn process(&mut self, input: f32) -> f32;

    /// Zero the history without touching coefficients.
    fn reset(&mut self);
}

/// Lowest cutoff any filter accepts, in Hz.
pub const MIN_CUTOFF: f32 = 1.0;
