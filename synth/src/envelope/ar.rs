use crate::{sanitize_sample_rate, DEFAULT_SAMPLE_RATE};

use super::{adsr::floor_time, increment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    Idle,
    Attack,
    Release,
}

/// Attack/release envelope for percussive sounds. The release starts as soon
/// as the attack peaks, there is no hold.
#[derive(Debug, Clone)]
pub struct Ar {
    stage: Stage,
    level: f32,
    increment: f32,
    attack_time: f32,
    release_time: f32,
    sample_rate: f32,
    attack_step: f32,
    release_step: f32,
}

impl Ar {
    /// 10 ms attack, 300 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut envelope = Self {
            stage: Stage::Idle,
            level: 0.0,
            increment: 0.0,
            attack_time: 0.01,
            release_time: 0.3,
            sample_rate: sanitize_sample_rate(sample_rate),
            attack_step: 0.0,
            release_step: 0.0,
        };
        envelope.update_increments();
        envelope
    }

    /// Times in seconds, floored at [`MIN_TIME`](crate::MIN_TIME).
    pub fn set_ar(&mut self, attack: f32, release: f32) {
        self.attack_time = floor_time(attack);
        self.release_time = floor_time(release);
        self.update_increments();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.update_increments();
    }

    /// Restart the attack from the current level, whatever the stage.
    pub fn trigger(&mut self) {
        self.enter(Stage::Attack);
    }

    pub fn process(&mut self) -> f32 {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                self.level += self.increment;

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.enter(Stage::Release);
                }
            }
            Stage::Release => {
                self.level += self.increment;

                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.enter(Stage::Idle);
                }
            }
        }

        self.level
    }

    pub fn process_input(&mut self, input: f32) -> f32 {
        input * self.process()
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn attack_time(&self) -> f32 {
        self.attack_time
    }

    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
        self.enter(Stage::Idle);
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.increment = match stage {
            Stage::Idle => 0.0,
            Stage::Attack => self.attack_step,
            Stage::Release => -self.release_step,
        };
    }

    fn update_increments(&mut self) {
        self.attack_step = increment(1.0, self.attack_time, self.sample_rate);
        self.release_step = increment(1.0, self.release_time, self.sample_rate);
        self.enter(self.stage);
    }
}

impl Default for Ar {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE as f32)
    }
}
