use crate::{
    clamp,
    phase::PhaseAccumulator,
    rng::XorShift32,
    waveforms::{BasicBank, Waveform},
    wavetable::Wavetable,
    TABLE_SIZE,
};

/// A wave generator reading an `N`-entry wavetable with linear interpolation.
///
/// The table is borrowed, not owned: any number of oscillators can share one
/// table, and [`set_wavetable`](Self::set_wavetable) swaps the content without
/// touching the phase so pitch stays continuous across a waveform change.
#[derive(Debug, Clone)]
pub struct WavetableOscillator<'a, const N: usize> {
    phase: PhaseAccumulator,
    wavetable: &'a Wavetable<N>,
    amplitude: f32,
}

/// Oscillator over the default table size.
pub type Oscillator<'a> = WavetableOscillator<'a, TABLE_SIZE>;

impl<'a, const N: usize> WavetableOscillator<'a, N> {
    pub fn new(wavetable: &'a Wavetable<N>, sample_rate: f32) -> Self {
        Self {
            phase: PhaseAccumulator::new(sample_rate),
            wavetable,
            amplitude: 1.0,
        }
    }

    /// Oscillator bound to one of the basic tables.
    pub fn with_waveform(bank: &'a BasicBank<N>, waveform: Waveform, sample_rate: f32) -> Self {
        Self::new(bank.wave(waveform), sample_rate)
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.phase.set_frequency(frequency);
    }

    /// Set the output gain, clamped to [0, 1].
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = clamp(amplitude, 0.0, 1.0);
    }

    pub fn set_phase(&mut self, phase: f32) {
        self.phase.set_phase(phase);
    }

    pub fn set_wavetable(&mut self, wavetable: &'a Wavetable<N>) {
        self.wavetable = wavetable;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.phase.set_sample_rate(sample_rate);
    }

    /// Advance one sample and return the scaled, interpolated table value.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let phase = self.phase.tick();
        self.wavetable.interpolated(phase * N as f32) * self.amplitude
    }

    pub fn reset(&mut self) {
        self.phase.reset();
    }

    pub fn frequency(&self) -> f32 {
        self.phase.frequency()
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn phase(&self) -> f32 {
        self.phase.phase()
    }

    pub fn wavetable(&self) -> &'a Wavetable<N> {
        self.wavetable
    }
}

/// White noise from the xorshift stream.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    rng: XorShift32,
    amplitude: f32,
}

impl NoiseGenerator {
    /// A zero `seed` is replaced with the default seed.
    pub fn new(seed: u32) -> Self {
        Self {
            rng: XorShift32::new(seed),
            amplitude: 1.0,
        }
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = clamp(amplitude, 0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self) -> f32 {
        self.rng.next_bipolar() * self.amplitude
    }

    pub fn reset(&mut self, seed: u32) {
        self.rng.reseed(seed);
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new(crate::rng::DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavetable::SAMPLE_SCALE;

    #[test]
    fn amplitude_is_clamped() {
        let table = Waveform::Square.table::<64>();
        let mut osc = WavetableOscillator::new(&table, 1000.0);
        osc.set_amplitude(2.0);
        assert_eq!(osc.amplitude(), 1.0);
        osc.set_amplitude(-1.0);
        assert_eq!(osc.amplitude(), 0.0);
        assert_eq!(osc.process(), 0.0);
    }

    #[test]
    fn reads_the_table_at_the_advanced_phase() {
        let table = Wavetable::new([0, 8192, 16384, 24576]);
        let mut osc = WavetableOscillator::new(&table, 1000.0);
        osc.set_frequency(125.0); // half a table entry per sample

        let out: Vec<f32> = (0..4).map(|_| osc.process()).collect();
        let expected = [4096.0, 8192.0, 12288.0, 16384.0].map(|v| v / SAMPLE_SCALE);
        for (a, b) in out.iter().zip(expected) {
            assert!((a - b).abs() < 1e-6, "{a} != {b}");
        }
    }

    #[test]
    fn swapping_tables_keeps_phase() {
        let bank = BasicBank::<256>::basic();
        let mut osc = WavetableOscillator::with_waveform(&bank, Waveform::Sine, 8000.0);
        osc.set_frequency(100.0);
        for _ in 0..17 {
            osc.process();
        }
        let before = osc.phase();
        osc.set_wavetable(bank.wave(Waveform::Square));
        assert_eq!(osc.phase(), before);

        // the next sample comes from the square table at the continued phase
        let next = osc.process();
        let expected = bank
            .wave(Waveform::Square)
            .interpolated(osc.phase() * 256.0);
        assert_eq!(next, expected);
    }

    #[test]
    fn reset_returns_to_phase_zero() {
        let table = Waveform::Saw.table::<64>();
        let mut osc = WavetableOscillator::new(&table, 1000.0);
        osc.set_frequency(10.0);
        osc.process();
        osc.reset();
        assert_eq!(osc.phase(), 0.0);
    }

    #[test]
    fn noise_is_bounded_and_scaled() {
        let mut noise = NoiseGenerator::new(0);
        noise.set_amplitude(0.5);
        for _ in 0..10_000 {
            let v = noise.process();
            assert!((-0.5..=0.5).contains(&v));
        }
    }

    #[test]
    fn noise_reset_replays_the_stream() {
        let mut noise = NoiseGenerator::new(1234);
        let first: Vec<f32> = (0..16).map(|_| noise.process()).collect();
        noise.reset(1234);
        let second: Vec<f32> = (0..16).map(|_| noise.process()).collect();
        assert_eq!(first, second);
    }
}
