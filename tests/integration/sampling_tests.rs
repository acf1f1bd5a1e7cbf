//! Sensor sampling and the inbound JSON path wired to real drivers.

use envnode::adapters::command_json::{self, CommandError};
use envnode::adapters::nvs::NvsAdapter;
use envnode::app::commands::DeviceClass;
use envnode::app::dispatcher::{ActuatorHandle, ActuatorWorker, CommandQueue, Dispatcher};
use envnode::app::events::AppEvent;
use envnode::app::ports::ConfigPort;
use envnode::app::sampler::Sampler;
use envnode::config::SystemConfig;
use envnode::drivers::relay::{ActuatorState, Relay};
use envnode::sensors::SensorKind;
use envnode::sensors::dht11::Dht11;
use envnode::sensors::sht3x::Sht3x;

use crate::mock_hw::{
    FakeClock, MockI2c, MockRelayPin, RecordingSink, Response, ScriptedLine, dht11_frame,
};

#[test]
fn dht11_sampler_publishes_only_verified_readings() {
    let clock = FakeClock::new();
    let mut corrupt = dht11_frame(70, 0, 30, 0);
    corrupt[4] = corrupt[4].wrapping_add(1);
    let line = ScriptedLine::new(
        &clock,
        [
            Response::dht11(dht11_frame(60, 0, 25, 0)),
            Response::dht11(corrupt),
            Response::silent(),
        ],
    );
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());
    let mut sampler = Sampler::new(2_000);
    let mut sink = RecordingSink::default();

    for slot in 0..3u64 {
        let r = sampler.poll(slot * 2_000, &mut dht, &mut sink);
        assert!(r.is_some());
    }

    assert_eq!(sink.events.len(), 1);
    let AppEvent::Reading { source, reading } = sink.events[0] else {
        panic!("expected a reading, got {:?}", sink.events[0]);
    };
    assert_eq!(source, SensorKind::Dht11);
    assert_eq!(reading.humidity_percent_rh, 60.0);
    assert_eq!(sampler.last_good(), Some(reading));
    assert_eq!(sampler.consecutive_failures(), 2);
    assert_eq!(dht.last_reading(), Some(reading));
}

#[test]
fn sht3x_sampler_tags_its_source() {
    let clock = FakeClock::new();
    let bus = MockI2c::answering(&[0x66, 0x66, 0x93, 0x80, 0x00, 0xA2]);
    let mut sht = Sht3x::new(
        bus,
        clock.delay(),
        clock.clone(),
        SystemConfig::default().sht3x_bus,
    )
    .unwrap();
    let mut sampler = Sampler::new(5_000);
    let mut sink = RecordingSink::default();

    sampler.poll(0, &mut sht, &mut sink).unwrap().unwrap();
    assert!(matches!(
        sink.events[..],
        [AppEvent::Reading {
            source: SensorKind::Sht3x,
            ..
        }]
    ));
}

#[test]
fn json_commands_reach_the_relay() {
    let config = SystemConfig::default();
    let queue = CommandQueue::new();
    let handle = ActuatorHandle::new();
    let mut dispatcher = Dispatcher::new(&queue);
    dispatcher.register(DeviceClass::Humidifier, &handle);

    let pin = MockRelayPin::default();
    let relay = Relay::new(pin.clone(), config.humidifier).unwrap();
    let mut worker = ActuatorWorker::new(DeviceClass::Humidifier, relay).unwrap();
    let mut sink = RecordingSink::default();

    command_json::handle_payload(&queue, br#"{"type":"HUMIDIFIER","state":"ON"}"#).unwrap();
    assert_eq!(
        command_json::handle_payload(&queue, br#"{"type":"fan","state":"sideways"}"#),
        Err(CommandError::UnknownState)
    );
    assert_eq!(queue.len(), 1);

    dispatcher.dispatch_pending();
    worker.apply_pending(&handle, &mut sink).unwrap().unwrap();

    // Humidifier relay is active-low by default.
    assert!(!pin.line.borrow().high);
    assert_eq!(
        sink.events,
        vec![AppEvent::StatusChanged {
            device: DeviceClass::Humidifier,
            state: ActuatorState::On,
        }]
    );
}

#[test]
fn stored_config_survives_reload() {
    let nvs = NvsAdapter::new().unwrap();
    let mut config = nvs.load().unwrap();
    config.sample_interval_ms = 30_000;
    config.sht3x_bus.address = 0x45;
    nvs.save(&config).unwrap();

    let reloaded = nvs.load().unwrap();
    assert_eq!(reloaded.sample_interval_ms, 30_000);
    assert_eq!(reloaded.sht3x_bus.address, 0x45);
}
