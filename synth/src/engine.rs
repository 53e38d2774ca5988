//! The sample clock: one periodic timer expiry produces exactly one output
//! sample.
//!
//! Hardware is reached through two small traits. A [`Transport`] turns a code
//! in `0..=full_scale` into an output level (a PWM compare register, a DAC, an
//! audio buffer). A [`Timer`] fires once per arm; [`SampleClock::on_expiry`]
//! must be called from that expiry (normally the timer interrupt handler).

use crate::clamp;

/// Lowest rate accepted by [`SampleClock::begin`].
pub const MIN_CLOCK_RATE: u32 = 1_000;
/// Highest rate accepted by [`SampleClock::begin`].
pub const MAX_CLOCK_RATE: u32 = 200_000;

const MICROS_PER_SECOND: u32 = 1_000_000;

/// Produces the next sample, nominally in [-1, 1]. Runs in interrupt context
/// and must not block.
pub trait SampleSource {
    fn next_sample(&mut self) -> f32;
}

impl<F> SampleSource for F
where
    F: FnMut() -> f32,
{
    fn next_sample(&mut self) -> f32 {
        self()
    }
}

pub trait Transport {
    type Error;

    /// Prepare the output for `sample_rate` samples per second.
    fn configure(&mut self, sample_rate: u32) -> Result<(), Self::Error>;

    /// Largest code accepted by [`write`](Self::write).
    fn full_scale(&self) -> u16;

    /// Code for silence.
    fn neutral(&self) -> u16 {
        self.full_scale() / 2
    }

    fn write(&mut self, value: u16);
}

pub trait Timer {
    type Error;

    /// Fire once, `period_us` after the previous deadline. After
    /// [`cancel`](Self::cancel), or on first use, the period counts from now.
    fn arm_once(&mut self, period_us: u32) -> Result<(), Self::Error>;

    fn cancel(&mut self);

    fn enable_interrupt(&mut self);

    fn disable_interrupt(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("sample rate {0} Hz is outside the supported range")]
    InvalidSampleRate(u32),
    #[error("output transport rejected the configuration")]
    TransportConfig,
    #[error("sample timer could not be armed")]
    TimerArm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockState {
    Stopped,
    Running,
}

/// Whole-microsecond periods whose sum tracks the exact rate: the remainder of
/// `1e6 / rate` is spread over the periods of every second.
#[derive(Debug, Clone, Copy)]
struct Period {
    whole: u32,
    remainder: u32,
    rate: u32,
    error: u32,
}

impl Period {
    fn new(rate: u32) -> Self {
        Self {
            whole: MICROS_PER_SECOND / rate,
            remainder: MICROS_PER_SECOND % rate,
            rate,
            error: 0,
        }
    }

    fn next(&mut self) -> u32 {
        self.error += self.remainder;
        if self.error >= self.rate {
            self.error -= self.rate;
            self.whole + 1
        } else {
            self.whole
        }
    }
}

/// Map a sample in [-1, 1] onto `0..=full_scale`. Out of range input is
/// clamped and NaN becomes the neutral code.
#[inline]
pub fn quantize(sample: f32, full_scale: u16) -> u16 {
    if sample.is_nan() {
        return full_scale / 2;
    }
    let sample = clamp(sample, -1.0, 1.0);
    ((sample + 1.0) * 0.5 * full_scale as f32) as u16
}

pub type Callback<'a> = &'a mut (dyn SampleSource + Send + 'a);

/// Drives a [`SampleSource`] at a fixed rate.
///
/// Created stopped. [`begin`](Self::begin) configures the transport and arms
/// the timer, every [`on_expiry`](Self::on_expiry) then writes one sample and
/// re-arms. A failed re-arm stops the clock and is reported by
/// [`fault`](Self::fault).
pub struct SampleClock<'a, T, M> {
    transport: T,
    timer: M,
    callback: Option<Callback<'a>>,
    state: ClockState,
    sample_rate: u32,
    period: Period,
    fault: Option<Error>,
}

impl<'a, T, M> SampleClock<'a, T, M>
where
    T: Transport,
    M: Timer,
{
    pub fn new(transport: T, timer: M) -> Self {
        Self {
            transport,
            timer,
            callback: None,
            state: ClockState::Stopped,
            sample_rate: 0,
            period: Period::new(MIN_CLOCK_RATE),
            fault: None,
        }
    }

    /// Start producing `sample_rate` samples per second from `callback`.
    /// Without a callback the clock still runs and emits silence.
    ///
    /// A running clock is stopped first. On error the clock is left stopped
    /// with the output at neutral.
    pub fn begin(
        &mut self,
        sample_rate: u32,
        callback: Option<Callback<'a>>,
    ) -> Result<(), Error> {
        if self.state == ClockState::Running {
            self.end();
        } else {
            // a callback parked with set_callback must not outlive a failed start
            self.callback = None;
        }

        if !(MIN_CLOCK_RATE..=MAX_CLOCK_RATE).contains(&sample_rate) {
            warn!("rejecting sample rate {=u32}", sample_rate);
            return Err(Error::InvalidSampleRate(sample_rate));
        }

        if self.transport.configure(sample_rate).is_err() {
            warn!("transport configuration failed");
            return Err(Error::TransportConfig);
        }

        self.sample_rate = sample_rate;
        self.period = Period::new(sample_rate);
        self.fault = None;
        self.transport.write(self.transport.neutral());
        self.callback = callback;
        self.state = ClockState::Running;

        self.timer.enable_interrupt();
        if self.timer.arm_once(self.period.next()).is_err() {
            self.end();
            warn!("could not arm the sample timer");
            return Err(Error::TimerArm);
        }

        info!("sample clock running at {=u32} Hz", sample_rate);
        Ok(())
    }

    /// One timer expiry: produce, write, re-arm.
    pub fn on_expiry(&mut self) {
        if self.state != ClockState::Running {
            return;
        }

        let value = match self.callback.as_mut() {
            Some(callback) => match callback.next_sample() {
                sample if sample.is_nan() => self.transport.neutral(),
                sample => quantize(sample, self.transport.full_scale()),
            },
            None => self.transport.neutral(),
        };
        self.transport.write(value);

        if self.timer.arm_once(self.period.next()).is_err() {
            self.stop(Some(Error::TimerArm));
        }
    }

    /// Disarm the timer, return the output to neutral and drop the callback.
    pub fn end(&mut self) {
        self.stop(None);
        info!("sample clock stopped");
    }

    /// Swap the callback while keeping the timing grid. The timer interrupt is
    /// masked during the swap. Returns the previous callback.
    pub fn set_callback(&mut self, callback: Option<Callback<'a>>) -> Option<Callback<'a>> {
        self.timer.disable_interrupt();
        let previous = core::mem::replace(&mut self.callback, callback);
        if self.state == ClockState::Running {
            self.timer.enable_interrupt();
        }
        previous
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Rate of the last successful [`begin`](Self::begin), 0 before that.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Error that stopped the clock from inside [`on_expiry`](Self::on_expiry).
    /// Cleared by the next successful `begin`.
    pub fn fault(&self) -> Option<Error> {
        self.fault
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn timer(&self) -> &M {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut M {
        &mut self.timer
    }

    /// Stop and hand back the hardware.
    pub fn release(mut self) -> (T, M) {
        self.end();
        (self.transport, self.timer)
    }

    fn stop(&mut self, fault: Option<Error>) {
        self.timer.cancel();
        self.timer.disable_interrupt();
        self.transport.write(self.transport.neutral());
        self.callback = None;
        self.state = ClockState::Stopped;

        if let Some(error) = fault {
            warn!("sample clock stopped: {}", error);
            self.fault = Some(error);
        }
    }
}
