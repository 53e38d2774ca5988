//! A complete monophonic voice (oscillator, low-pass filter, amplitude
//! envelope), and a wrapper that follows lock-free controls so it can be
//! driven from the sample interrupt.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::{
    engine::SampleSource,
    envelope::{adsr::Parameters, Adsr},
    filter::StateVariable,
    oscillator::WavetableOscillator,
    param::SharedParam,
    waveforms::{BasicBank, Waveform},
    wavetable::Wavetable,
};

pub struct Voice<'a, const N: usize> {
    oscillator: WavetableOscillator<'a, N>,
    filter: StateVariable,
    envelope: Adsr,
}

impl<'a, const N: usize> Voice<'a, N> {
    pub fn new(wavetable: &'a Wavetable<N>, sample_rate: f32, params: Parameters) -> Self {
        Self {
            oscillator: WavetableOscillator::new(wavetable, sample_rate),
            filter: StateVariable::new(sample_rate),
            envelope: Adsr::with_parameters(params, sample_rate),
        }
    }

    pub fn note_on(&mut self) {
        self.envelope.note_on()
    }

    pub fn note_off(&mut self) {
        self.envelope.note_off()
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    pub fn next_sample(&mut self) -> f32 {
        let sample = self.oscillator.process();

        // the filter keeps running while idle so a retrigger starts from settled state
        self.filter.process(sample);

        self.envelope.process_input(self.filter.low())
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.oscillator.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        self.envelope.set_sample_rate(sample_rate);
    }

    pub fn oscillator(&self) -> &WavetableOscillator<'a, N> {
        &self.oscillator
    }

    pub fn oscillator_mut(&mut self) -> &mut WavetableOscillator<'a, N> {
        &mut self.oscillator
    }

    pub fn filter(&self) -> &StateVariable {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut StateVariable {
        &mut self.filter
    }

    pub fn envelope(&self) -> &Adsr {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut Adsr {
        &mut self.envelope
    }
}

/// Voice settings written from the foreground and read once per sample.
#[derive(Debug)]
pub struct VoiceControls {
    gate: AtomicBool,
    waveform: AtomicU8,
    frequency: SharedParam,
    cutoff: SharedParam,
    resonance: SharedParam,
}

impl VoiceControls {
    pub const fn new(waveform: Waveform, frequency: f32, cutoff: f32, resonance: f32) -> Self {
        Self {
            gate: AtomicBool::new(false),
            waveform: AtomicU8::new(waveform as u8),
            frequency: SharedParam::new(frequency),
            cutoff: SharedParam::new(cutoff),
            resonance: SharedParam::new(resonance),
        }
    }

    pub fn set_gate(&self, on: bool) {
        self.gate.store(on, Ordering::Relaxed);
    }

    pub fn gate(&self) -> bool {
        self.gate.load(Ordering::Relaxed)
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform as u8, Ordering::Relaxed);
    }

    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed))
    }

    pub fn set_frequency(&self, frequency: f32) {
        self.frequency.set(frequency);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency.get()
    }

    pub fn set_cutoff(&self, cutoff: f32) {
        self.cutoff.set(cutoff);
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff.get()
    }

    pub fn set_resonance(&self, resonance: f32) {
        self.resonance.set(resonance);
    }

    pub fn resonance(&self) -> f32 {
        self.resonance.get()
    }
}

/// A [`Voice`] that applies [`VoiceControls`] changes at sample boundaries.
pub struct ControlledVoice<'a, const N: usize> {
    voice: Voice<'a, N>,
    controls: &'a VoiceControls,
    bank: &'a BasicBank<N>,
    gate: bool,
    waveform: Waveform,
    frequency: f32,
    cutoff: f32,
    resonance: f32,
}

impl<'a, const N: usize> ControlledVoice<'a, N> {
    pub fn new(
        bank: &'a BasicBank<N>,
        controls: &'a VoiceControls,
        sample_rate: f32,
        params: Parameters,
    ) -> Self {
        let waveform = controls.waveform();
        let mut voice = Self {
            voice: Voice::new(bank.wave(waveform), sample_rate, params),
            controls,
            bank,
            gate: false,
            waveform,
            frequency: controls.frequency(),
            cutoff: controls.cutoff(),
            resonance: controls.resonance(),
        };
        voice.voice.oscillator_mut().set_frequency(voice.frequency);
        voice.voice.filter_mut().set_params(voice.cutoff, voice.resonance);
        voice
    }

    /// Pick up control changes since the last sample.
    pub fn sync(&mut self) {
        let controls = self.controls;

        let gate = controls.gate();
        if gate != self.gate {
            self.gate = gate;
            if gate {
                self.voice.note_on();
            } else {
                self.voice.note_off();
            }
        }

        let waveform = controls.waveform();
        if waveform != self.waveform {
            self.waveform = waveform;
            self.voice
                .oscillator_mut()
                .set_wavetable(self.bank.wave(waveform));
        }

        let frequency = controls.frequency();
        if frequency.to_bits() != self.frequency.to_bits() {
            self.frequency = frequency;
            self.voice.oscillator_mut().set_frequency(frequency);
        }

        let cutoff = controls.cutoff();
        let resonance = controls.resonance();
        if cutoff.to_bits() != self.cutoff.to_bits()
            || resonance.to_bits() != self.resonance.to_bits()
        {
            self.cutoff = cutoff;
            self.resonance = resonance;
            self.voice.filter_mut().set_params(cutoff, resonance);
        }
    }

    pub fn voice(&self) -> &Voice<'a, N> {
        &self.voice
    }

    pub fn voice_mut(&mut self) -> &mut Voice<'a, N> {
        &mut self.voice
    }
}

impl<const N: usize> SampleSource for ControlledVoice<'_, N> {
    fn next_sample(&mut self) -> f32 {
        self.sync();
        self.voice.next_sample()
    }
}
