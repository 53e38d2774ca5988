//! Audio out as the duty cycle of a PWM slice, smoothed by an external RC
//! filter on the pin.

use embedded_hal::pwm::SetDutyCycle;
use rp_pico::hal::pwm::{FreeRunning, Pwm0, Slice};
use ticksynth::Transport;

/// Counter wrap value, giving 12-bit output codes.
pub const PWM_TOP: u16 = 4095;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum PwmError {
    /// The carrier would be slower than the sample rate.
    CarrierTooSlow { carrier_hz: u32 },
}

/// Writes samples to channel B of PWM slice 0 (GPIO1).
pub struct PwmTransport {
    slice: Slice<Pwm0, FreeRunning>,
    sys_clock_hz: u32,
}

impl PwmTransport {
    pub fn new(mut slice: Slice<Pwm0, FreeRunning>, sys_clock_hz: u32) -> Self {
        slice.disable();
        slice.set_top(PWM_TOP);
        slice.set_div_int(1);
        slice.set_div_frac(0);
        Self {
            slice,
            sys_clock_hz,
        }
    }
}

impl Transport for PwmTransport {
    type Error = PwmError;

    fn configure(&mut self, sample_rate: u32) -> Result<(), PwmError> {
        let carrier_hz = self.sys_clock_hz / (PWM_TOP as u32 + 1);
        if carrier_hz < sample_rate {
            defmt::error!(
                "PWM carrier {=u32} Hz is below the sample rate {=u32} Hz",
                carrier_hz,
                sample_rate
            );
            return Err(PwmError::CarrierTooSlow { carrier_hz });
        }

        self.slice.enable();
        defmt::debug!("PWM carrier at {=u32} Hz", carrier_hz);
        Ok(())
    }

    fn full_scale(&self) -> u16 {
        PWM_TOP
    }

    #[inline]
    fn write(&mut self, value: u16) {
        // infallible on this HAL
        let _ = self.slice.channel_b.set_duty_cycle(value);
    }
}
