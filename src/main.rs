//! EnvNode firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  LogEventSink   NvsAdapter   Esp32TimeAdapter   command_json   │
//! │  (EventSink)    (Config)     (MonotonicClock)   (inbound)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  core 1: [dht11 thread]  Sampler ─▶ Dht11 (open-drain GPIO)    │
//! │          [sht3x thread]  Sampler ─▶ Sht3x (I2C0)               │
//! │                                                                │
//! │  core 0: [dispatch thread, edge-executor]                      │
//! │          Dispatcher ─▶ ActuatorWorker(fan)        ─▶ Relay     │
//! │                     └▶ ActuatorWorker(humidifier) ─▶ Relay     │
//! │                                                                │
//! │  main:   console lines ─▶ command_json ─▶ COMMAND_QUEUE        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;

use anyhow::{Context, Result, anyhow};
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, IOPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use envnode::adapters::command_json;
use envnode::adapters::i2c_bus::BoundedI2c;
use envnode::adapters::log_sink::LogEventSink;
use envnode::adapters::nvs::NvsAdapter;
use envnode::adapters::time::Esp32TimeAdapter;
use envnode::app::commands::DeviceClass;
use envnode::app::dispatcher::{ActuatorHandle, ActuatorWorker, CommandQueue, Dispatcher};
use envnode::app::events::AppEvent;
use envnode::app::ports::{ConfigPort, EventSink, MonotonicClock, SensorPort};
use envnode::app::sampler::Sampler;
use envnode::config::SystemConfig;
use envnode::drivers::relay::Relay;
use envnode::drivers::task_pin::{self, DHT11_TASK, DISPATCH_TASK, SHT3X_TASK};
use envnode::sensors::dht11::Dht11;
use envnode::sensors::sht3x::Sht3x;

// ── Cross-task handoff ────────────────────────────────────────

static COMMAND_QUEUE: CommandQueue = CommandQueue::new();
static FAN_HANDLE: ActuatorHandle = ActuatorHandle::new();
static HUMIDIFIER_HANDLE: ActuatorHandle = ActuatorHandle::new();

/// Idle time between console polls when no input is pending.
const CONSOLE_POLL_MS: u32 = 100;

/// Failed samples in a row before a sensor is reported as down.
const SENSOR_FAILURE_ALERT: u32 = 5;

// ── Pin table ─────────────────────────────────────────────────

/// Output-capable GPIOs, taken by number as the config names them.
struct PinPool {
    pins: Vec<(u8, Option<AnyIOPin>)>,
}

impl PinPool {
    fn new(pins: esp_idf_hal::gpio::Pins) -> Self {
        Self {
            pins: vec![
                (2, Some(pins.gpio2.downgrade())),
                (4, Some(pins.gpio4.downgrade())),
                (5, Some(pins.gpio5.downgrade())),
                (13, Some(pins.gpio13.downgrade())),
                (14, Some(pins.gpio14.downgrade())),
                (15, Some(pins.gpio15.downgrade())),
                (16, Some(pins.gpio16.downgrade())),
                (17, Some(pins.gpio17.downgrade())),
                (18, Some(pins.gpio18.downgrade())),
                (19, Some(pins.gpio19.downgrade())),
                (21, Some(pins.gpio21.downgrade())),
                (22, Some(pins.gpio22.downgrade())),
                (23, Some(pins.gpio23.downgrade())),
                (25, Some(pins.gpio25.downgrade())),
                (26, Some(pins.gpio26.downgrade())),
                (27, Some(pins.gpio27.downgrade())),
                (32, Some(pins.gpio32.downgrade())),
                (33, Some(pins.gpio33.downgrade())),
            ],
        }
    }

    fn take(&mut self, gpio: u8) -> Result<AnyIOPin> {
        self.pins
            .iter_mut()
            .find(|(n, _)| *n == gpio)
            .and_then(|(_, pin)| pin.take())
            .ok_or_else(|| anyhow!("GPIO{} unavailable or already in use", gpio))
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EnvNode v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    config
        .validate()
        .map_err(|e| anyhow!("invalid config: {}", e))?;

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let mut pins = PinPool::new(peripherals.pins);
    let clock = Esp32TimeAdapter::new();

    // ── 3. Actuators ──────────────────────────────────────────
    let fan_pin = PinDriver::input_output(pins.take(config.fan.pin)?)?;
    let humidifier_pin = PinDriver::input_output(pins.take(config.humidifier.pin)?)?;
    let mut fan = ActuatorWorker::new(DeviceClass::Fan, Relay::new(fan_pin, config.fan)?)?;
    let mut humidifier = ActuatorWorker::new(
        DeviceClass::Humidifier,
        Relay::new(humidifier_pin, config.humidifier)?,
    )?;

    LogEventSink::new(&config).emit(&AppEvent::Started {
        fan: fan.reported_state(),
        humidifier: humidifier.reported_state(),
    });

    let dispatch_cfg = config.clone();
    task_pin::spawn_on_core(DISPATCH_TASK, move || {
        let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

        let mut dispatcher = Dispatcher::new(&COMMAND_QUEUE);
        dispatcher.register(DeviceClass::Fan, &FAN_HANDLE);
        dispatcher.register(DeviceClass::Humidifier, &HUMIDIFIER_HANDLE);

        let mut fan_sink = LogEventSink::new(&dispatch_cfg);
        let mut humidifier_sink = LogEventSink::new(&dispatch_cfg);

        executor
            .spawn(async move { dispatcher.run().await })
            .detach();
        executor
            .spawn(async move { fan.run(&FAN_HANDLE, &mut fan_sink).await })
            .detach();
        executor
            .spawn(async move { humidifier.run(&HUMIDIFIER_HANDLE, &mut humidifier_sink).await })
            .detach();

        futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    })?;

    // ── 4. Sensors ────────────────────────────────────────────
    let mut dht_pin = PinDriver::input_output_od(pins.take(config.dht11_gpio)?)?;
    dht_pin.set_pull(Pull::Up)?;
    dht_pin.set_high()?;
    let dht = Dht11::new(dht_pin, clock, Ets);
    spawn_sampler(DHT11_TASK, dht, clock, &config)?;

    let bus = &config.sht3x_bus;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        pins.take(bus.sda_gpio)?,
        pins.take(bus.scl_gpio)?,
        &I2cConfig::new().baudrate(Hertz(bus.clock_hz)),
    )?;
    let sht = Sht3x::new(BoundedI2c::new(i2c), FreeRtos, clock, *bus)?;
    spawn_sampler(SHT3X_TASK, sht, clock, &config)?;

    // ── 5. Inbound commands ───────────────────────────────────
    info!(
        "Ready: send JSON commands for '{}' on the console",
        config.command_topic
    );
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(n) if n > 0 && !line.trim().is_empty() => {
                if let Err(e) = command_json::handle_payload(&COMMAND_QUEUE, line.trim().as_bytes())
                {
                    warn!("console: ignored '{}': {}", line.trim(), e);
                }
            }
            Ok(_) => FreeRtos::delay_ms(CONSOLE_POLL_MS),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                FreeRtos::delay_ms(CONSOLE_POLL_MS);
            }
            Err(e) => {
                error!("console: {}", e);
                FreeRtos::delay_ms(CONSOLE_POLL_MS);
            }
        }
    }
}

/// Run `sensor` on its own pinned thread at the configured interval.
fn spawn_sampler<S>(
    task: task_pin::TaskParams,
    mut sensor: S,
    clock: Esp32TimeAdapter,
    config: &SystemConfig,
) -> Result<()>
where
    S: SensorPort + Send + 'static,
{
    let mut sampler = Sampler::new(config.sample_interval_ms);
    let mut sink = LogEventSink::new(config);

    task_pin::spawn_on_core(task, move || {
        loop {
            if let Some(Err(e)) = sampler.poll(clock.now_ms(), &mut sensor, &mut sink) {
                if sampler.consecutive_failures() == SENSOR_FAILURE_ALERT {
                    error!(
                        "{}: {} consecutive failed samples, last: {}",
                        sensor.kind().as_str(),
                        SENSOR_FAILURE_ALERT,
                        e
                    );
                }
            }
            let wait = sampler.ms_until_due(clock.now_ms());
            FreeRtos::delay_ms(wait.clamp(1, u64::from(u32::MAX)) as u32);
        }
    })?;
    Ok(())
}
