//! Fixed-size, read-only single-cycle tables of quantized samples.

/// Sample type stored in a wavetable.
pub type WavetableSample = i16;

/// Value of a full-scale (+1.0) sample.
pub const SAMPLE_SCALE: f32 = 32767.0;

/// One cycle of a waveform, `N` signed 16-bit samples with full scale ±1.0.
///
/// Tables are built once before the sample clock starts and are then only read,
/// so a single table can back any number of oscillators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wavetable<const N: usize> {
    samples: [WavetableSample; N],
}

impl<const N: usize> Wavetable<N> {
    pub const fn new(samples: [WavetableSample; N]) -> Self {
        Self { samples }
    }

    /// Build a table by evaluating `f` at every index. Values are clamped to
    /// [-1.0, 1.0] before being quantized.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(usize) -> f32,
    {
        let mut samples = [0; N];
        for (i, s) in samples.iter_mut().enumerate() {
            *s = quantize(f(i));
        }
        Self { samples }
    }

    /// Raw sample at `index`, wrapped to the table length.
    pub fn sample(&self, index: usize) -> WavetableSample {
        self.samples[index % N]
    }

    /// Linearly interpolated sample at a fractional `index`, in [-1.0, 1.0].
    ///
    /// The index is reduced modulo `N` first, and the last entry interpolates
    /// towards entry 0, so the lookup is continuous across the wrap.
    #[inline]
    pub fn interpolated(&self, index: f32) -> f32 {
        let size = N as f32;

        let mut index = index - libm::floorf(index / size) * size;
        // NaN, infinities and a reduction that rounds up to `size` all land here
        if !(index >= 0.0 && index < size) {
            index = 0.0;
        }

        let i1 = index as usize;
        let i2 = if i1 + 1 >= N { 0 } else { i1 + 1 };
        let frac = index - i1 as f32;

        let s1 = self.samples[i1] as f32;
        let s2 = self.samples[i2] as f32;

        (s1 + frac * (s2 - s1)) / SAMPLE_SCALE
    }

    pub const fn size(&self) -> usize {
        N
    }

    pub fn samples(&self) -> &[WavetableSample; N] {
        &self.samples
    }
}

/// A fixed group of `W` equally sized tables addressed by index.
#[derive(Debug, Clone)]
pub struct WavetableBank<const W: usize, const N: usize> {
    waves: [Wavetable<N>; W],
}

impl<const W: usize, const N: usize> WavetableBank<W, N> {
    pub const fn new(waves: [Wavetable<N>; W]) -> Self {
        Self { waves }
    }

    /// Table at `index`, wrapped to the bank size.
    pub fn get(&self, index: usize) -> &Wavetable<N> {
        &self.waves[index % W]
    }

    pub const fn len(&self) -> usize {
        W
    }

    pub const fn is_empty(&self) -> bool {
        W == 0
    }

    pub const fn wave_size(&self) -> usize {
        N
    }
}

/// Quantize a float sample to the table representation. NaN is stored as
/// silence.
pub fn quantize(value: f32) -> WavetableSample {
    if value.is_nan() {
        return 0;
    }
    let value = crate::clamp(value, -1.0, 1.0);
    libm::roundf(value * SAMPLE_SCALE) as WavetableSample
}
