#![no_std]
#![no_main]

mod alarm;
mod defmt_uart;
mod pwm;
mod util;

use cortex_m::singleton;
use defmt::*;
use embedded_hal::digital::OutputPin;

use panic_probe as _;

use rp_pico as bsp;

use bsp::{
    entry,
    hal::{
        self,
        clocks::{init_clocks_and_plls, Clock},
        gpio::{
            bank0::{Gpio16, Gpio17},
            FunctionUart, Pin, PullDown,
        },
        pac::{self, interrupt},
        sio::Sio,
        uart::{DataBits, StopBits, UartConfig, UartPeripheral},
        watchdog::Watchdog,
    },
};
use fugit::RateExtU32;

use ticksynth::{
    envelope::adsr::Parameters, BasicBank, ControlledVoice, SampleClock, VoiceControls, Waveform,
    DEFAULT_SAMPLE_RATE, TABLE_SIZE,
};

use alarm::AlarmTimer;
use pwm::PwmTransport;
use util::GlobalCell;

/// Alias the type for our UART pins to make things clearer.
type Uart0Pins = (
    Pin<Gpio16, FunctionUart, PullDown>,
    Pin<Gpio17, FunctionUart, PullDown>,
);

type Uart0 = UartPeripheral<hal::uart::Enabled, pac::UART0, Uart0Pins>;

type AudioClock = SampleClock<'static, PwmTransport, AlarmTimer>;

/// UART used by the defmt logger.
static LOG_UART: GlobalCell<Uart0> = GlobalCell::empty();

/// The sample clock, driven from `TIMER_IRQ_0`.
static CLOCK: GlobalCell<AudioClock> = GlobalCell::empty();

/// Voice settings, changed from the main loop without locking.
static CONTROLS: VoiceControls = VoiceControls::new(Waveform::Saw, 220.0, 1_200.0, 2.0);

const SAMPLE_RATE: u32 = DEFAULT_SAMPLE_RATE;

/// Notes played by the demo loop, in Hz.
const MELODY: [f32; 4] = [220.0, 261.63, 329.63, 392.0];

#[entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let core = pac::CorePeripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);

    let clocks = init_clocks_and_plls(
        bsp::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let mut delay = cortex_m::delay::Delay::new(core.SYST, clocks.system_clock.freq().to_Hz());

    let pins = bsp::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // logging on GPIO16/17, GPIO1 is taken by the audio PWM
    let uart_pins = (
        pins.gpio16.into_function::<FunctionUart>(),
        pins.gpio17.into_function::<FunctionUart>(),
    );

    let uart = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS)
        .enable(
            UartConfig::new(115200.Hz(), DataBits::Eight, None, StopBits::One),
            clocks.peripheral_clock.freq(),
        )
        .unwrap();

    LOG_UART.put(uart);

    // UART is now initialized, and we can start using defmt macros!
    info!("ticksynth start");
    let mut led_pin = pins.led.into_push_pull_output();

    // tables and voice live for the whole program, the interrupt borrows them
    let bank = singleton!(: BasicBank<TABLE_SIZE> = BasicBank::basic()).unwrap();
    let voice = singleton!(: ControlledVoice<'static, TABLE_SIZE> = ControlledVoice::new(
        bank,
        &CONTROLS,
        SAMPLE_RATE as f32,
        Parameters::new(0.005, 0.15, 0.6, 0.3),
    ))
    .unwrap();

    let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut slice = pwm_slices.pwm0;
    slice.channel_b.output_to(pins.gpio1);
    let transport = PwmTransport::new(slice, clocks.system_clock.freq().to_Hz());

    let alarm = timer.alarm_0().unwrap();
    let mut clock = SampleClock::new(transport, AlarmTimer::new(timer, alarm));

    match clock.begin(SAMPLE_RATE, Some(voice)) {
        Ok(()) => info!("audio running at {=u32} Hz", SAMPLE_RATE),
        Err(e) => error!("audio failed to start: {}", e),
    }

    CLOCK.put(clock);

    // finally enable the interrupt in the NVIC
    unsafe {
        pac::NVIC::unmask(pac::Interrupt::TIMER_IRQ_0);
    }

    let mut step = 0usize;
    loop {
        CONTROLS.set_frequency(MELODY[step % MELODY.len()]);
        if step % (4 * MELODY.len()) == 0 {
            let waveform = Waveform::from_index((step / (4 * MELODY.len())) as u8);
            CONTROLS.set_waveform(waveform);
            info!("waveform {}", waveform.name());
        }

        CONTROLS.set_gate(true);
        led_pin.set_high().unwrap();
        delay.delay_ms(300);

        CONTROLS.set_gate(false);
        led_pin.set_low().unwrap();
        delay.delay_ms(200);

        if let Some(Some(fault)) = CLOCK.with(|clock| clock.fault()) {
            error!("sample clock stopped: {}", fault);
        }

        step = step.wrapping_add(1);
    }
}

#[interrupt]
fn TIMER_IRQ_0() {
    CLOCK.with(|clock| {
        clock.timer_mut().acknowledge();
        clock.on_expiry();
    });
}
