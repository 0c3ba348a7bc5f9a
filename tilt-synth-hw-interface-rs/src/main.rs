//! tilt-synth-hw-interface
//!
//! Tilt-controlled synthesizer firmware for the Raspberry Pi Pico 2. Wires
//! the library crates into a running instrument:
//!
//! 1. The synthesis tick runs on a high-priority interrupt executor. Every
//!    other tick it reads the shared parameters and loads one 12-bit code
//!    into the PWM "DAC".
//! 2. The accelerometer's INT line (or the tick's poll counter) raises the
//!    sensor-ready flag.
//! 3. Three button tasks debounce their lines and raise the octave and
//!    waveform flags.
//! 4. The control task drains the flags, reads the tilt and the slider,
//!    updates the shared parameters and redraws the OLED.
//!
//! Only the control task writes parameters; only the tick task owns the
//! phase accumulator.

#![no_std]
#![no_main]

mod slider;
mod transport;

use defmt::*;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::adc::{self, Adc};
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::{self, Pwm, PwmOutput};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Ticker, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use accel_driver::{Mma8451, Range, DEFAULT_ADDRESS};
use tilt_synth::dds::{FULL_SCALE, MID_SCALE};
use tilt_synth::{
    run_button, Button, ControlError, ControlLoop, DebounceConfig, DutyCycleSink, Event,
    PendingEvents, SensorReadyStrategy, SynthConfig, SynthState, SynthTick,
};
use tilt_synth_oled_display_rs::{GridConfig, OledCharDisplay, OledDriver};

use slider::{AdcSlider, DEFAULT_DEAD_BAND};
use transport::Timed;

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
    ADC_IRQ_FIFO => adc::InterruptHandler;
});

/// Executor for the synthesis tick; preempts everything else.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Parameters shared by the control task (writer) and the tick (reader).
static STATE: SynthState = SynthState::new();

/// One-shot flags raised by the tick, the INT line and the buttons.
static EVENTS: PendingEvents = PendingEvents::new();

/// Shared I2C0 bus: accelerometer and OLED display.
static I2C_BUS: StaticCell<
    Mutex<CriticalSectionRawMutex, I2c<'static, I2C0, i2c::Async>>,
> = StaticCell::new();

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// One device on I2C_BUS.
type SharedI2c = I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, I2C0, i2c::Async>>;

type Sensor = Timed<Mma8451<SharedI2c>>;
type Display = Timed<OledCharDisplay<SharedI2c>>;
type VolumeSlider = Timed<AdcSlider<'static>>;

/// Log loop statistics every this many iterations (about 10 s at 10 ms).
const STATS_INTERVAL: u32 = 1_000;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Synthesis tick. Nothing in here blocks, allocates or logs.
#[embassy_executor::task]
async fn tick_task(mut sink: DutyCycleSink<PwmOutput<'static>>, config: SynthConfig) {
    let mut tick = SynthTick::new(&config);
    // Whole microseconds: the engine is built for exactly this period.
    let mut ticker = Ticker::every(Duration::from_micros(config.tick_period_us()));

    loop {
        ticker.next().await;
        tick.run(&STATE, &EVENTS, &mut sink);
    }
}

/// Accelerometer INT line: a falling edge means a new motion sample.
#[embassy_executor::task]
async fn sensor_edge_task(mut int_pin: Input<'static>) {
    info!("Sensor edge task started");
    loop {
        int_pin.wait_for_falling_edge().await;
        EVENTS.raise(Event::SensorSampleReady);
    }
}

/// Monomorphic wrapper around the generic button loop; one instance per
/// button.
#[embassy_executor::task(pool_size = 3)]
async fn button_task(line: Input<'static>, button: Button, config: DebounceConfig) {
    info!("{} task started", button);
    run_button(line, Delay, button, &EVENTS, config).await
}

/// Foreground loop: sensor, buttons, slider, display.
#[embassy_executor::task]
async fn control_task(
    mut control: ControlLoop<'static, Sensor, Display, VolumeSlider>,
    config: SynthConfig,
) {
    info!("Control task started");

    if control.draw_all().await.is_err() {
        warn!("Initial screen draw failed");
    }

    loop {
        match control.step().await {
            Ok(()) => {}
            Err(ControlError::Sensor(e)) => warn!("Sensor read failed: {}", e),
            Err(ControlError::Display(e)) => warn!("Display update failed: {}", e),
            Err(ControlError::Slider(e)) => warn!("Slider read failed: {}", e),
        }

        let stats = control.stats();
        if stats.iterations % STATS_INTERVAL == 0 {
            debug!("{}", stats);
        }

        Timer::after_millis(config.control_period_ms as u64).await;
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("tilt-synth-hw-interface starting");

    let config = SynthConfig::default();
    info!("{}", config);
    info!(
        "Tick every {} us, {} Hz sample rate",
        config.tick_period_us(),
        config.sample_rate_hz()
    );

    // —— Pin assignments ————————————————————————————————————————————————————
    // I2C_SDA   → GP20  (p.PIN_20)
    // I2C_SCL   → GP21  (p.PIN_21)
    // ACCEL_INT → GP19  (p.PIN_19)  active-low, pull-up enabled
    // BTN_UP    → GP10  (p.PIN_10)  active-low, pull-up enabled
    // BTN_DOWN  → GP11  (p.PIN_11)  active-low, pull-up enabled
    // BTN_WAVE  → GP12  (p.PIN_12)  active-low, pull-up enabled
    // AUDIO_PWM → GP16  (p.PIN_16)  PWM slice 0 channel A, RC filtered
    // SLIDER    → GP26  (p.PIN_26)  ADC0
    // ———————————————————————————————————————————————————————————————————————

    // —— Output: PWM at 12-bit resolution, parked at mid-scale ———————————————
    let mut pwm_config = pwm::Config::default();
    pwm_config.top = FULL_SCALE;
    pwm_config.compare_a = MID_SCALE as u16;
    let pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, pwm_config);
    let (audio_out, _) = pwm.split();
    let Some(audio_out) = audio_out else {
        error!("PWM channel A unavailable; audio disabled");
        return;
    };
    let sink = DutyCycleSink::new(audio_out);

    // —— Shared I2C0: accelerometer and OLED ————————————————————————————————
    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_21, // SCL
        p.PIN_20, // SDA
        Irqs,
        i2c::Config::default(),
    );
    let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

    let mut accel = Mma8451::new(I2cDevice::new(i2c_bus), DEFAULT_ADDRESS);
    match accel.init(Range::G2).await {
        Ok(()) => info!("Accelerometer ready"),
        Err(e) => error!("Accelerometer init failed: {}", e),
    }

    let mut display = OledCharDisplay::new(
        OledDriver::new(I2cDevice::new(i2c_bus), 0x3C),
        GridConfig::default(),
    );
    if let Err(e) = display.init().await {
        error!("OLED init failed: {}", e);
    }

    // —— Slider ————————————————————————————————————————————————————————————
    let adc = Adc::new(p.ADC, Irqs, adc::Config::default());
    let slider_channel = adc::Channel::new_pin(p.PIN_26, Pull::None);
    let slider = AdcSlider::new(adc, slider_channel, DEFAULT_DEAD_BAND);

    let control = ControlLoop::new(
        Timed::new(accel, config.transport_timeout_ms),
        Timed::new(display, config.transport_timeout_ms),
        Timed::new(slider, config.transport_timeout_ms),
        &STATE,
        &EVENTS,
    );

    // —— Spawn tasks ————————————————————————————————————————————————————————

    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(tick_task(sink, config)).unwrap();

    if config.sensor_ready == SensorReadyStrategy::EdgeTriggered {
        spawner
            .spawn(sensor_edge_task(Input::new(p.PIN_19, Pull::Up)))
            .unwrap();
    }

    let buttons = [
        (Input::new(p.PIN_10, Pull::Up), Button::OctaveUp),
        (Input::new(p.PIN_11, Pull::Up), Button::OctaveDown),
        (Input::new(p.PIN_12, Pull::Up), Button::WaveformCycle),
    ];
    for (line, button) in buttons {
        spawner.spawn(button_task(line, button, config.debounce)).unwrap();
    }

    spawner.spawn(control_task(control, config)).unwrap();

    info!("All tasks spawned");
}
