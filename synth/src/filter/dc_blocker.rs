use super::Processor;

/// Pole of the blocker, about 3.5 Hz at 44.1 kHz.
pub const POLE: f32 = 0.995;

/// Fixed high-pass that strips a constant offset: `y[n] = x[n] - x[n-1] + R·y[n-1]`.
#[derive(Debug, Clone, Default)]
pub struct DcBlocker {
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    pub const fn new() -> Self {
        Self { x1: 0.0, y1: 0.0 }
    }
}

impl Processor for DcBlocker {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x1 + POLE * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}
