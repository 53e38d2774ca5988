use std::{
    convert::Infallible,
    io::{self, BufRead},
    str::FromStr,
    thread,
};

use anyhow::{anyhow, bail, Context, Error, Result};
use clap::Parser;
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, Stream,
};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use ticksynth::{
    envelope::adsr::Parameters, BasicBank, ControlledVoice, DcBlocker, Lfo, Processor,
    SampleClock, SampleSource, Timer, Transport, VoiceControls, Waveform, TABLE_SIZE,
};

/// Shared between the command loop and the audio callback.
static CONTROLS: VoiceControls = VoiceControls::new(Waveform::Saw, 220.0, 1_200.0, 1.0);

const HELP: &str = "\
commands:
  on | off          gate the note
  wave <name>       sine, saw, square, triangle, soft-saw, pulse
  freq <hz>         oscillator frequency
  cutoff <hz>       filter cutoff
  res <q>           filter resonance (0.1 - 10)
  help              this text
  quit              exit";

#[derive(Parser, Debug)]
#[command(name = "ticksynth")]
#[command(version, about = "Play one synth voice on the default audio output")]
struct Args {
    /// Starting waveform
    #[arg(long, short = 'w', default_value = "saw")]
    waveform: Waveform,

    /// Oscillator frequency in Hz
    #[arg(long, short = 'f', default_value_t = 220.0)]
    frequency: f32,

    /// Filter cutoff in Hz
    #[arg(long, short = 'c', default_value_t = 1_200.0)]
    cutoff: f32,

    /// Filter resonance
    #[arg(long, short = 'r', default_value_t = 1.0)]
    resonance: f32,

    /// Attack time in seconds
    #[arg(long, default_value_t = 0.01)]
    attack: f32,

    /// Decay time in seconds
    #[arg(long, default_value_t = 0.1)]
    decay: f32,

    /// Sustain level (0 - 1)
    #[arg(long, default_value_t = 0.7)]
    sustain: f32,

    /// Release time in seconds
    #[arg(long, default_value_t = 0.3)]
    release: f32,

    /// Cutoff sweep rate in Hz, 0 turns the sweep off
    #[arg(long, default_value_t = 0.0)]
    lfo_rate: f32,

    /// Cutoff sweep depth in octaves
    #[arg(long, default_value_t = 1.0)]
    lfo_depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    On,
    Off,
    Wave(Waveform),
    Frequency(f32),
    Cutoff(f32),
    Resonance(f32),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let mut arg = || words.next().ok_or_else(|| anyhow!("`{name}` needs a value"));

        let command = match name {
            "on" => Command::On,
            "off" => Command::Off,
            "wave" => Command::Wave(arg()?.parse()?),
            "freq" => Command::Frequency(number(arg()?)?),
            "cutoff" => Command::Cutoff(number(arg()?)?),
            "res" => Command::Resonance(number(arg()?)?),
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`"),
        };
        Ok(command)
    }
}

fn number(word: &str) -> Result<f32> {
    word.parse()
        .with_context(|| format!("`{word}` is not a number"))
}

/// Holds the last written code. Full 16-bit range.
#[derive(Debug, Default)]
struct HostTransport {
    code: u16,
}

impl HostTransport {
    fn sample(&self) -> f32 {
        self.code as f32 / u16::MAX as f32 * 2.0 - 1.0
    }
}

impl Transport for HostTransport {
    type Error = Infallible;

    fn configure(&mut self, sample_rate: u32) -> Result<(), Infallible> {
        debug!("host transport at {} Hz", sample_rate);
        Ok(())
    }

    fn full_scale(&self) -> u16 {
        u16::MAX
    }

    fn write(&mut self, value: u16) {
        self.code = value;
    }
}

/// The audio device pulls frames at the sample rate, so each frame is one
/// timer expiry.
#[derive(Debug, Default)]
struct FrameTimer {
    armed: bool,
    interrupt: bool,
}

impl FrameTimer {
    fn take_expiry(&mut self) -> bool {
        let fired = self.armed && self.interrupt;
        if fired {
            self.armed = false;
        }
        fired
    }
}

impl Timer for FrameTimer {
    type Error = Infallible;

    fn arm_once(&mut self, _period_us: u32) -> Result<(), Infallible> {
        self.armed = true;
        Ok(())
    }

    fn cancel(&mut self) {
        self.armed = false;
    }

    fn enable_interrupt(&mut self) {
        self.interrupt = true;
    }

    fn disable_interrupt(&mut self) {
        self.interrupt = false;
    }
}

struct Engine {
    clock: SampleClock<'static, HostTransport, FrameTimer>,
}

impl Engine {
    fn new(args: &Args, sample_rate: u32) -> Result<Self> {
        // the callback runs for the rest of the program
        let bank: &'static BasicBank<TABLE_SIZE> = Box::leak(Box::new(BasicBank::basic()));
        let params = Parameters::new(args.attack, args.decay, args.sustain, args.release);
        let mut voice = ControlledVoice::new(bank, &CONTROLS, sample_rate as f32, params);

        let mut sweep = (args.lfo_rate > 0.0).then(|| {
            let mut lfo = Lfo::new(sample_rate as f32);
            lfo.set_frequency(args.lfo_rate);
            lfo
        });
        let depth = args.lfo_depth;
        let mut dc = DcBlocker::new();

        let source = move || {
            if let Some(lfo) = sweep.as_mut() {
                let octaves = lfo.process() * depth;
                voice
                    .voice_mut()
                    .filter_mut()
                    .set_cutoff(CONTROLS.cutoff() * octaves.exp2());
            }
            dc.process(voice.next_sample())
        };
        let callback: &'static mut (dyn SampleSource + Send) = Box::leak(Box::new(source));

        let mut clock = SampleClock::new(HostTransport::default(), FrameTimer::default());
        clock
            .begin(sample_rate, Some(callback))
            .context("start sample clock")?;

        Ok(Self { clock })
    }

    /// Used to fill the data buffer of samples.
    /// Is generic to accommodate the different data types required by different platforms.
    fn write_data<T>(&mut self, output: &mut [T], channels: usize)
    where
        T: cpal::Sample + FromSample<f32>,
    {
        for frame in output.chunks_mut(channels) {
            if self.clock.timer_mut().take_expiry() {
                self.clock.on_expiry();
            }

            let value: T = T::from_sample(self.clock.transport().sample());

            // same value on every channel
            for sample in frame.iter_mut() {
                *sample = value;
            }
        }
    }
}

fn read_loop(tx: Sender<Command>) -> Result<()> {
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line.context("read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                tx.send(command)?;
                if command == Command::Quit {
                    break;
                }
            }
            Err(e) => warn!("{e:#}"),
        }
    }

    Ok(())
}

/// Apply one command, returning `false` when the program should exit.
fn apply(command: Command) -> bool {
    debug!(?command, "command");

    match command {
        Command::On => CONTROLS.set_gate(true),
        Command::Off => CONTROLS.set_gate(false),
        Command::Wave(waveform) => {
            CONTROLS.set_waveform(waveform);
            info!("waveform {}", waveform.name());
        }
        Command::Frequency(hz) => CONTROLS.set_frequency(hz),
        Command::Cutoff(hz) => CONTROLS.set_cutoff(hz),
        Command::Resonance(q) => CONTROLS.set_resonance(q),
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
    }
    true
}

fn run(rx: Receiver<Command>) {
    for command in rx.iter() {
        if !apply(command) {
            break;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    CONTROLS.set_waveform(args.waveform);
    CONTROLS.set_frequency(args.frequency);
    CONTROLS.set_cutoff(args.cutoff);
    CONTROLS.set_resonance(args.resonance);

    // create channel for commands
    let (tx, rx) = crossbeam_channel::unbounded();

    // create sound engine stream and start it
    let stream = setup_sound(&args)?;
    stream.play()?;

    println!("{HELP}");

    // stdin is read on its own thread, the main thread applies the commands
    let handle = thread::spawn(move || read_loop(tx));
    run(rx);

    drop(stream);
    info!("stopped");

    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("input thread panicked")),
    }
}

fn setup_sound(args: &Args) -> Result<Stream> {
    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .context("no output device available")?;

    let config = device.default_output_config()?;
    info!("output config: {:?}", config);

    // construct the sound engine instance
    let engine = Engine::new(args, config.sample_rate().0)?;

    match config.sample_format() {
        cpal::SampleFormat::F32 => construct_stream::<f32>(&device, &config.into(), engine),
        cpal::SampleFormat::I16 => construct_stream::<i16>(&device, &config.into(), engine),
        cpal::SampleFormat::U16 => construct_stream::<u16>(&device, &config.into(), engine),
        format => Err(anyhow!("unsupported sample format {format}")),
    }
}

fn construct_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: Engine,
) -> Result<Stream>
where
    T: cpal::Sample + cpal::SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| engine.write_data(data, channels),
            move |err| error!("an error occurred on stream: {}", err),
            None,
        )
        .map_err(Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("on".parse::<Command>().unwrap(), Command::On);
        assert_eq!("  off ".parse::<Command>().unwrap(), Command::Off);
        assert_eq!(
            "wave Soft-Saw".parse::<Command>().unwrap(),
            Command::Wave(Waveform::SoftSaw)
        );
        assert_eq!(
            "cutoff 800".parse::<Command>().unwrap(),
            Command::Cutoff(800.0)
        );
        assert_eq!("res 2.5".parse::<Command>().unwrap(), Command::Resonance(2.5));
        assert_eq!("freq 440".parse::<Command>().unwrap(), Command::Frequency(440.0));
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_bad_commands() {
        assert!("".parse::<Command>().is_err());
        assert!("wave".parse::<Command>().is_err());
        assert!("wave organ".parse::<Command>().is_err());
        assert!("cutoff high".parse::<Command>().is_err());
        assert!("jump".parse::<Command>().is_err());
    }

    #[test]
    fn host_transport_maps_codes_to_samples() {
        let mut transport = HostTransport::default();
        transport.write(0);
        assert_eq!(transport.sample(), -1.0);
        transport.write(u16::MAX);
        assert_eq!(transport.sample(), 1.0);
        transport.write(transport.neutral());
        assert!(transport.sample().abs() < 1e-4);
    }

    #[test]
    fn frame_timer_fires_once_per_arm() {
        let mut timer = FrameTimer::default();
        timer.enable_interrupt();
        assert!(!timer.take_expiry());
        timer.arm_once(23).unwrap();
        assert!(timer.take_expiry());
        assert!(!timer.take_expiry());
    }

    #[test]
    fn engine_loop_produces_a_note() {
        let args = Args::parse_from(["ticksynth", "--waveform", "square", "--attack", "0.001"]);
        let mut engine = Engine::new(&args, 48_000).unwrap();
        let mut buffer = vec![0.0f32; 2 * 4_800];

        engine.write_data(&mut buffer, 2);
        assert!(buffer.iter().all(|s| s.abs() < 1e-3));

        CONTROLS.set_gate(true);
        engine.write_data(&mut buffer, 2);
        CONTROLS.set_gate(false);

        assert!(buffer.iter().any(|s| s.abs() > 0.05));
        assert!(buffer.chunks(2).all(|frame| frame[0] == frame[1]));
    }
}
