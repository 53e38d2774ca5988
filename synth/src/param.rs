//! Lock-free parameter passing between foreground code and the sample
//! interrupt.

use core::sync::atomic::{AtomicU32, Ordering};

/// An `f32` that one context writes and another reads, without a critical
/// section. Only plain loads and stores are used, so it also works on cores
/// without compare-and-swap.
#[derive(Debug)]
pub struct SharedParam {
    bits: AtomicU32,
}

impl SharedParam {
    pub const fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for SharedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
