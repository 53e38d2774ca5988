//! Sample timer on hardware alarm 0.
//!
//! Deadlines are kept as absolute timer instants and each new one is the
//! previous deadline plus one period, so interrupt latency never accumulates.

use fugit::MicrosDurationU64;
use rp_pico::hal::{
    timer::{Alarm, Alarm0, Instant, ScheduleAlarmError},
    Timer as HalTimer,
};
use ticksynth::Timer;

pub struct AlarmTimer {
    timer: HalTimer,
    alarm: Alarm0,
    deadline: Option<Instant>,
}

impl AlarmTimer {
    pub fn new(timer: HalTimer, alarm: Alarm0) -> Self {
        Self {
            timer,
            alarm,
            deadline: None,
        }
    }

    /// Clear the alarm's interrupt flag. First thing in the handler.
    #[inline]
    pub fn acknowledge(&mut self) {
        self.alarm.clear_interrupt();
    }
}

impl Timer for AlarmTimer {
    type Error = ScheduleAlarmError;

    fn arm_once(&mut self, period_us: u32) -> Result<(), ScheduleAlarmError> {
        let base = match self.deadline {
            Some(deadline) => deadline,
            None => self.timer.get_counter(),
        };
        let deadline = base + MicrosDurationU64::micros(period_us as u64);

        self.alarm.schedule_at(deadline)?;
        self.deadline = Some(deadline);
        Ok(())
    }

    fn cancel(&mut self) {
        let _ = self.alarm.cancel();
        self.deadline = None;
    }

    fn enable_interrupt(&mut self) {
        self.alarm.enable_interrupt();
    }

    fn disable_interrupt(&mut self) {
        self.alarm.disable_interrupt();
    }
}
