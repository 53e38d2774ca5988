use ticksynth::{
    envelope::{
        adsr::{self, Parameters},
        ar,
        lfo::Shape,
    },
    Adsr, Ar, BasicBank, Lfo, OnePole, Oscillator, PhaseAccumulator, Waveform, TABLE_SIZE,
};

fn distance_to_zero(phase: f32) -> f32 {
    phase.min(1.0 - phase)
}

#[test]
fn phase_returns_to_zero_after_one_period() {
    for sample_rate in [8_000.0f32, 22_050.0, 44_100.0, 48_000.0] {
        for frequency in [27.5f32, 100.0, 440.0, 1_000.0, 3_520.0] {
            let mut phase = PhaseAccumulator::new(sample_rate);
            phase.set_frequency(frequency);
            let period = (sample_rate / frequency).round() as usize;
            for _ in 0..period {
                phase.tick();
            }
            let increment = phase.increment() as f32;
            assert!(
                distance_to_zero(phase.phase()) <= increment,
                "{frequency} Hz at {sample_rate}: phase {}",
                phase.phase()
            );
        }
    }
}

#[test]
fn sine_output_is_continuous_across_wraps() {
    let bank: BasicBank<TABLE_SIZE> = BasicBank::basic();
    let mut osc = Oscillator::with_waveform(&bank, Waveform::Sine, 44_100.0);
    osc.set_frequency(1_234.5);

    let max_step = 2.0 * core::f32::consts::PI * 1_234.5 / 44_100.0 + 1e-3;
    let mut last = osc.process();
    for _ in 0..44_100 {
        let next = osc.process();
        assert!((next - last).abs() <= max_step, "{last} -> {next}");
        assert!(osc.phase() >= 0.0 && osc.phase() < 1.0);
        last = next;
    }
}

#[test]
fn one_pole_outputs_sum_to_input() {
    let mut filter = OnePole::new(44_100.0);
    filter.set_cutoff(800.0);
    let mut seed = 0x1234_5678u32;
    for _ in 0..10_000 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let input = seed as f32 / u32::MAX as f32 * 2.0 - 1.0;
        let (low, high) = filter.process_split(input);
        assert!((low + high - input).abs() < 1e-6);
    }
}

#[test]
fn adsr_reaches_sustain_on_time() {
    let sample_rate = 44_100.0;
    let (attack, decay, sustain) = (0.01, 0.1, 0.6);
    let mut env = Adsr::with_parameters(Parameters::new(attack, decay, sustain, 0.2), sample_rate);
    env.note_on();

    let mut attack_samples = 0;
    while env.stage() == adsr::Stage::Attack {
        env.process();
        attack_samples += 1;
    }
    let mut decay_samples = 0;
    while env.stage() == adsr::Stage::Decay {
        env.process();
        decay_samples += 1;
    }

    let expected_attack = (attack * sample_rate).round() as i32;
    let expected_decay = (decay * sample_rate).round() as i32;
    assert!((attack_samples - expected_attack).abs() <= 1, "{attack_samples}");
    assert!((decay_samples - expected_decay).abs() <= 1, "{decay_samples}");
    assert_eq!(env.stage(), adsr::Stage::Sustain);
    assert_eq!(env.level(), sustain);
}

#[test]
fn note_off_during_attack_only_falls() {
    let mut env = Adsr::with_parameters(Parameters::new(0.05, 0.05, 0.8, 0.05), 48_000.0);
    env.note_on();
    for _ in 0..1_000 {
        env.process();
    }
    assert_eq!(env.stage(), adsr::Stage::Attack);

    env.note_off();
    let mut last = env.level();
    while env.is_active() {
        let level = env.process();
        assert!(level < last || level == 0.0);
        last = level;
    }
    assert_eq!(env.level(), 0.0);
}

#[test]
fn adsr_release_finishes_within_release_time() {
    let sample_rate = 22_050.0;
    let release = 0.25;
    let mut env = Adsr::with_parameters(Parameters::new(0.01, 0.02, 0.7, release), sample_rate);
    env.note_on();
    for _ in 0..2_000 {
        let level = env.process();
        assert!((0.0..=1.0).contains(&level));
    }

    env.note_off();
    let limit = (release * sample_rate).ceil() as usize + 1;
    let mut samples = 0;
    while env.is_active() {
        let level = env.process();
        assert!((0.0..=1.0).contains(&level));
        samples += 1;
        assert!(samples <= limit, "release took {samples} samples");
    }
    assert_eq!(env.stage(), adsr::Stage::Idle);
    assert_eq!(env.level(), 0.0);
}

#[test]
fn ar_cycle_finishes_within_configured_time() {
    let sample_rate = 22_050.0;
    let (attack, release) = (0.005, 0.1);
    let mut env = Ar::new(sample_rate);
    env.set_ar(attack, release);
    env.trigger();

    let limit = ((attack + release) * sample_rate) as usize + 2;
    let mut samples = 0;
    while env.is_active() {
        let level = env.process();
        assert!((0.0..=1.0).contains(&level));
        samples += 1;
        assert!(samples <= limit);
    }
    assert_eq!(env.stage(), ar::Stage::Idle);
}

#[test]
fn sample_and_hold_changes_once_per_wrap() {
    let mut lfo = Lfo::new(1_000.0);
    lfo.set_frequency(7.0);
    lfo.set_shape(Shape::SampleHold);
    lfo.seed(0xC0FFEE);

    let mut captures = 1;
    let mut changes = 0;
    let mut last = lfo.process();
    let mut previous_phase = lfo.phase();

    for i in 1..1_000 {
        let value = lfo.process();
        if value != last {
            changes += 1;
        }
        last = value;

        // a wrap arms a capture for the following sample
        let phase = lfo.phase();
        if phase < previous_phase && i < 999 {
            captures += 1;
        }
        previous_phase = phase;
    }

    assert!(captures > 1);
    assert_eq!(changes + 1, captures);
}

#[test]
fn end_to_end_440_hz_at_22050() {
    let sample_rate = 22_050.0;
    let frequency = 440.0;
    let bank: BasicBank<TABLE_SIZE> = BasicBank::basic();
    let mut osc = Oscillator::with_waveform(&bank, Waveform::Sine, sample_rate);
    osc.set_frequency(frequency);
    osc.set_amplitude(1.0);

    let increment = frequency / sample_rate;
    let output: Vec<f32> = (0..50).map(|_| osc.process()).collect();
    assert!(distance_to_zero(osc.phase()) <= increment);

    let reference: Vec<f32> = (1..=50)
        .map(|n| libm::sinf(2.0 * core::f32::consts::PI * n as f32 * increment))
        .collect();

    let crossings = |signal: &[f32]| -> Vec<usize> {
        signal
            .windows(2)
            .enumerate()
            .filter(|(_, w)| (w[0] >= 0.0) != (w[1] >= 0.0))
            .map(|(i, _)| i)
            .collect()
    };

    let ours = crossings(&output);
    let theirs = crossings(&reference);
    assert_eq!(ours.len(), theirs.len());
    for (a, b) in ours.iter().zip(&theirs) {
        assert!(a.abs_diff(*b) <= 1, "{a} vs {b}");
    }
}
