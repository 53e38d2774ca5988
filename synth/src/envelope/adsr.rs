use crate::{clamp, sanitize_sample_rate, DEFAULT_SAMPLE_RATE, MIN_TIME};

use super::increment;

/// Envelope shape. Times are in seconds and floored at [`MIN_TIME`], the
/// sustain level is clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,
}

impl Parameters {
    pub fn new(attack_time: f32, decay_time: f32, sustain_level: f32, release_time: f32) -> Self {
        Self {
            attack_time: floor_time(attack_time),
            decay_time: floor_time(decay_time),
            sustain_level: clamp(sustain_level, 0.0, 1.0),
            release_time: floor_time(release_time),
        }
    }

    pub fn attack_time(&self) -> f32 {
        self.attack_time
    }

    pub fn decay_time(&self) -> f32 {
        self.decay_time
    }

    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }

    pub fn release_time(&self) -> f32 {
        self.release_time
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new(0.01, 0.1, 0.7, 0.3)
    }
}

pub(crate) fn floor_time(time: f32) -> f32 {
    clamp(time, MIN_TIME, f32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear attack/decay/sustain/release envelope.
///
/// `level` moves by `increment` every sample towards `target`; when a stage's
/// exit condition is met, stage, target and increment are replaced together.
#[derive(Debug, Clone)]
pub struct Adsr {
    params: Parameters,
    stage: Stage,
    level: f32,
    target: f32,
    increment: f32,
    sample_rate: f32,
    attack_step: f32,
    decay_step: f32,
    // level lost per sample, per unit of level at note off
    release_rate: f32,
}

impl Adsr {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_parameters(Parameters::default(), sample_rate)
    }

    pub fn with_parameters(params: Parameters, sample_rate: f32) -> Self {
        let mut envelope = Self {
            params,
            stage: Stage::Idle,
            level: 0.0, // start at 0
            target: 0.0,
            increment: 0.0,
            sample_rate: sanitize_sample_rate(sample_rate),
            attack_step: 0.0,
            decay_step: 0.0,
            release_rate: 0.0,
        };
        envelope.update_increments();
        envelope
    }

    pub fn set_parameters(&mut self, params: Parameters) {
        self.params = params;
        self.update_increments();
    }

    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.set_parameters(Parameters::new(attack, decay, sustain, release));
    }

    pub fn set_attack(&mut self, attack: f32) {
        let p = self.params;
        self.set_adsr(attack, p.decay_time, p.sustain_level, p.release_time);
    }

    pub fn set_decay(&mut self, decay: f32) {
        let p = self.params;
        self.set_adsr(p.attack_time, decay, p.sustain_level, p.release_time);
    }

    pub fn set_sustain(&mut self, sustain: f32) {
        let p = self.params;
        self.set_adsr(p.attack_time, p.decay_time, sustain, p.release_time);
    }

    pub fn set_release(&mut self, release: f32) {
        let p = self.params;
        self.set_adsr(p.attack_time, p.decay_time, p.sustain_level, release);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.update_increments();
    }

    /// Start (or restart) the attack from the current level.
    pub fn note_on(&mut self) {
        self.enter(Stage::Attack);
    }

    /// Release from whatever stage is running. Ignored while idle.
    pub fn note_off(&mut self) {
        if self.stage != Stage::Idle {
            self.enter(Stage::Release);
        }
    }

    /// Advance one sample and return the new level.
    pub fn process(&mut self) -> f32 {
        use Stage::*;

        match self.stage {
            Idle => {
                self.level = 0.0;
            }
            Attack => {
                self.level += self.increment;

                if self.level >= self.target {
                    self.level = self.target;
                    self.enter(Decay);
                }
            }
            Decay => {
                self.level += self.increment;

                if self.level <= self.target {
                    self.level = self.target;
                    self.enter(Sustain);
                }
            }
            Sustain => {
                // follows sustain changes made while holding
                self.level = self.params.sustain_level;
            }
            Release => {
                self.level += self.increment;

                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.enter(Idle);
                }
            }
        }

        self.level
    }

    /// Scale `input` by the next envelope level.
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

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn parameters(&self) -> Parameters {
        self.params
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
        self.enter(Stage::Idle);
    }

    fn enter(&mut self, stage: Stage) {
        let (target, increment) = match stage {
            Stage::Idle => (0.0, 0.0),
            Stage::Attack => (1.0, self.attack_step),
            Stage::Decay => (self.params.sustain_level, -self.decay_step),
            Stage::Sustain => (self.params.sustain_level, 0.0),
            Stage::Release => (0.0, -self.level * self.release_rate),
        };

        self.stage = stage;
        self.target = target;
        self.increment = increment;
    }

    fn update_increments(&mut self) {
        let p = self.params;
        self.attack_step = increment(1.0, p.attack_time, self.sample_rate);
        self.decay_step = increment(1.0 - p.sustain_level, p.decay_time, self.sample_rate);
        self.release_rate = increment(1.0, p.release_time, self.sample_rate);

        // keep the running stage consistent with the new shape
        if self.stage != Stage::Release {
            self.enter(self.stage);
        }
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1000.0;

    fn envelope(attack: f32, decay: f32, sustain: f32, release: f32) -> Adsr {
        Adsr::with_parameters(
            Parameters::new(attack, decay, sustain, release),
            SAMPLE_RATE,
        )
    }

    #[test]
    fn parameters_are_validated() {
        let p = Parameters::new(-1.0, 0.0, 1.5, f32::NAN);
        assert_eq!(p.attack_time(), MIN_TIME);
        assert_eq!(p.decay_time(), MIN_TIME);
        assert_eq!(p.sustain_level(), 1.0);
        assert_eq!(p.release_time(), MIN_TIME);
    }

    #[test]
    fn idle_outputs_silence() {
        let mut env = Adsr::new(SAMPLE_RATE);
        assert_eq!(env.process(), 0.0);
        assert!(!env.is_active());
        env.note_off();
        assert_eq!(env.stage(), Stage::Idle);
    }

    #[test]
    fn walks_through_every_stage() {
        // 4 samples attack, 8 samples decay to 0.5, 4 samples release
        let mut env = envelope(0.004, 0.008, 0.5, 0.004);
        env.note_on();
        assert_eq!(env.stage(), Stage::Attack);

        let attack: Vec<f32> = (0..4).map(|_| env.process()).collect();
        assert_eq!(attack, [0.25, 0.5, 0.75, 1.0]);
        assert_eq!(env.stage(), Stage::Decay);

        for _ in 0..8 {
            env.process();
        }
        assert_eq!(env.stage(), Stage::Sustain);
        assert_eq!(env.level(), 0.5);

        for _ in 0..100 {
            assert_eq!(env.process(), 0.5);
        }

        env.note_off();
        let release: Vec<f32> = (0..4).map(|_| env.process()).collect();
        assert_eq!(release, [0.375, 0.25, 0.125, 0.0]);
        assert_eq!(env.stage(), Stage::Idle);
    }

    #[test]
    fn note_off_during_attack_falls_immediately() {
        let mut env = envelope(0.1, 0.1, 0.5, 0.05);
        env.note_on();
        for _ in 0..10 {
            env.process();
        }
        let peak = env.level();
        env.note_off();
        assert_eq!(env.stage(), Stage::Release);
        let next = env.process();
        assert!(next < peak);
    }

    #[test]
    fn note_off_before_first_sample_goes_idle() {
        let mut env = Adsr::new(SAMPLE_RATE);
        env.note_on();
        env.note_off();
        assert_eq!(env.process(), 0.0);
        assert_eq!(env.stage(), Stage::Idle);
    }

    #[test]
    fn retrigger_attacks_from_current_level() {
        let mut env = envelope(0.004, 0.008, 0.5, 0.004);
        env.note_on();
        for _ in 0..20 {
            env.process();
        }
        env.note_off();
        env.process();
        env.note_on();
        assert_eq!(env.stage(), Stage::Attack);
        assert_eq!(env.process(), 0.375 + 0.25);
    }

    #[test]
    fn full_sustain_skips_decay() {
        let mut env = envelope(0.002, 0.5, 1.0, 0.1);
        env.note_on();
        env.process();
        env.process();
        assert_eq!(env.stage(), Stage::Decay);
        assert_eq!(env.process(), 1.0);
        assert_eq!(env.stage(), Stage::Sustain);
    }

    #[test]
    fn sustain_change_while_holding_is_followed() {
        let mut env = envelope(0.002, 0.002, 0.5, 0.1);
        env.note_on();
        for _ in 0..10 {
            env.process();
        }
        assert_eq!(env.stage(), Stage::Sustain);
        env.set_sustain(0.8);
        assert_eq!(env.process(), 0.8);
    }

    #[test]
    fn process_input_scales_signal() {
        let mut env = envelope(0.004, 0.008, 0.5, 0.004);
        env.note_on();
        assert_eq!(env.process_input(0.5), 0.125);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut env = Adsr::new(SAMPLE_RATE);
        env.note_on();
        env.process();
        env.reset();
        assert_eq!(env.stage(), Stage::Idle);
        assert_eq!(env.level(), 0.0);
    }
}
