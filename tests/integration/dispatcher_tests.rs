//! Command path end to end: queue → dispatcher → mailbox → worker → relay.

use std::pin::pin;

use edge_executor::LocalExecutor;
use futures_lite::future::{block_on, poll_once};
use envnode::app::commands::{Command, DeviceClass};
use envnode::app::dispatcher::{ActuatorHandle, ActuatorWorker, CommandQueue, Dispatcher};
use envnode::app::events::AppEvent;
use envnode::drivers::relay::{ActuatorIdentity, ActuatorState, Polarity, Relay};
use envnode::error::ActuatorError;

use crate::mock_hw::{MockRelayPin, RecordingSink, SharedSink};

fn worker(
    device: DeviceClass,
    polarity: Polarity,
) -> (ActuatorWorker<MockRelayPin>, MockRelayPin) {
    let pin = MockRelayPin::default();
    let relay = Relay::new(pin.clone(), ActuatorIdentity { pin: 25, polarity }).unwrap();
    (ActuatorWorker::new(device, relay).unwrap(), pin)
}

fn status(device: DeviceClass, state: ActuatorState) -> AppEvent {
    AppEvent::StatusChanged { device, state }
}

#[test]
fn fan_on_off_on_drives_each_transition_once() {
    let queue = CommandQueue::new();
    let fan_handle = ActuatorHandle::new();
    let mut dispatcher = Dispatcher::new(&queue);
    dispatcher.register(DeviceClass::Fan, &fan_handle);
    let (mut fan, pin) = worker(DeviceClass::Fan, Polarity::ActiveLow);
    let mut sink = RecordingSink::default();

    for state in [
        ActuatorState::On,
        ActuatorState::Off,
        ActuatorState::On,
        ActuatorState::On,
    ] {
        queue.submit(Command::new(DeviceClass::Fan, state)).unwrap();
        assert_eq!(dispatcher.dispatch_pending(), 1);
        fan.apply_pending(&fan_handle, &mut sink).unwrap().unwrap();
    }

    // Active-low: forced OFF at bring-up (high), then ON, OFF, ON, ON.
    assert_eq!(pin.line.borrow().writes, vec![true, false, true, false, false]);
    assert_eq!(
        sink.events,
        vec![
            status(DeviceClass::Fan, ActuatorState::On),
            status(DeviceClass::Fan, ActuatorState::Off),
            status(DeviceClass::Fan, ActuatorState::On),
        ]
    );
    assert_eq!(fan.reported_state(), ActuatorState::On);
}

#[test]
fn slow_worker_ends_on_latest_request() {
    let queue = CommandQueue::new();
    let fan_handle = ActuatorHandle::new();
    let mut dispatcher = Dispatcher::new(&queue);
    dispatcher.register(DeviceClass::Fan, &fan_handle);
    let (mut fan, pin) = worker(DeviceClass::Fan, Polarity::ActiveHigh);
    let mut sink = RecordingSink::default();

    for state in [ActuatorState::On, ActuatorState::Off, ActuatorState::On] {
        queue.submit(Command::new(DeviceClass::Fan, state)).unwrap();
    }
    assert_eq!(dispatcher.dispatch_pending(), 3);

    assert_eq!(
        fan.apply_pending(&fan_handle, &mut sink),
        Some(Ok(ActuatorState::On))
    );
    assert_eq!(fan.apply_pending(&fan_handle, &mut sink), None);
    assert_eq!(pin.line.borrow().writes, vec![false, true]);
    assert_eq!(sink.events, vec![status(DeviceClass::Fan, ActuatorState::On)]);
}

#[test]
fn commands_route_by_device_class() {
    let queue = CommandQueue::new();
    let fan_handle = ActuatorHandle::new();
    let hum_handle = ActuatorHandle::new();
    let mut dispatcher = Dispatcher::new(&queue);
    dispatcher.register(DeviceClass::Fan, &fan_handle);
    dispatcher.register(DeviceClass::Humidifier, &hum_handle);
    let (mut fan, fan_pin) = worker(DeviceClass::Fan, Polarity::ActiveLow);
    let (mut hum, hum_pin) = worker(DeviceClass::Humidifier, Polarity::ActiveLow);
    let mut sink = RecordingSink::default();

    queue
        .submit(Command::new(DeviceClass::Humidifier, ActuatorState::On))
        .unwrap();
    dispatcher.dispatch_pending();

    assert_eq!(fan.apply_pending(&fan_handle, &mut sink), None);
    assert_eq!(
        hum.apply_pending(&hum_handle, &mut sink),
        Some(Ok(ActuatorState::On))
    );
    assert!(fan_pin.line.borrow().high);
    assert!(!hum_pin.line.borrow().high);
    assert_eq!(fan_pin.line.borrow().writes.len(), 1);
    assert_eq!(
        sink.events,
        vec![status(DeviceClass::Humidifier, ActuatorState::On)]
    );
}

#[test]
fn failed_write_publishes_nothing() {
    let (mut fan, pin) = worker(DeviceClass::Fan, Polarity::ActiveLow);
    let mut sink = RecordingSink::default();

    pin.line.borrow_mut().fail_writes = true;
    assert_eq!(
        fan.apply(ActuatorState::On, &mut sink),
        Err(ActuatorError::WriteFailed)
    );
    assert!(sink.events.is_empty());
    assert_eq!(fan.reported_state(), ActuatorState::Off);
    assert_eq!(fan.relay_mut().last_known(), ActuatorState::Off);
}

#[test]
fn stuck_relay_reports_observed_state() {
    let (mut fan, pin) = worker(DeviceClass::Fan, Polarity::ActiveHigh);
    let mut sink = RecordingSink::default();

    pin.line.borrow_mut().stuck = Some(false);
    assert_eq!(fan.apply(ActuatorState::On, &mut sink), Ok(ActuatorState::Off));
    assert!(sink.events.is_empty());
}

#[test]
fn run_loops_deliver_each_command() {
    let queue = CommandQueue::new();
    let fan_handle = ActuatorHandle::new();
    let (mut fan, pin) = worker(DeviceClass::Fan, Polarity::ActiveLow);
    let mut sink = SharedSink::default();
    let events = sink.events.clone();

    let mut dispatcher = Dispatcher::new(&queue);
    dispatcher.register(DeviceClass::Fan, &fan_handle);
    let mut dispatch_task = pin!(dispatcher.run());
    let mut fan_task = pin!(fan.run(&fan_handle, &mut sink));

    let mut step = || {
        assert!(block_on(poll_once(dispatch_task.as_mut())).is_none());
        assert!(block_on(poll_once(fan_task.as_mut())).is_none());
    };

    step();
    queue
        .submit(Command::new(DeviceClass::Fan, ActuatorState::On))
        .unwrap();
    step();
    assert!(queue.is_empty());
    assert!(!pin.line.borrow().high);

    queue
        .submit(Command::new(DeviceClass::Fan, ActuatorState::Off))
        .unwrap();
    step();
    assert!(pin.line.borrow().high);

    assert_eq!(
        *events.borrow(),
        vec![
            status(DeviceClass::Fan, ActuatorState::On),
            status(DeviceClass::Fan, ActuatorState::Off),
        ]
    );
}

#[test]
fn queued_burst_reaches_the_relay_in_order_on_one_executor() {
    let queue = CommandQueue::new();
    let fan_handle = ActuatorHandle::new();
    let (mut fan, pin) = worker(DeviceClass::Fan, Polarity::ActiveHigh);
    let mut sink = SharedSink::default();
    let events = sink.events.clone();
    let mut dispatcher = Dispatcher::new(&queue);
    dispatcher.register(DeviceClass::Fan, &fan_handle);

    for state in [ActuatorState::On, ActuatorState::Off, ActuatorState::On] {
        queue.submit(Command::new(DeviceClass::Fan, state)).unwrap();
    }

    // Same task layout as the firmware's dispatch thread.
    let fan_handle = &fan_handle;
    let executor: LocalExecutor<'_, 4> = LocalExecutor::new();
    executor
        .spawn(async move { dispatcher.run().await })
        .detach();
    executor
        .spawn(async move { fan.run(fan_handle, &mut sink).await })
        .detach();

    for _ in 0..50 {
        executor.try_tick();
    }

    assert!(queue.is_empty());
    // Forced OFF at bring-up, then each queued state in turn.
    assert_eq!(pin.line.borrow().writes, vec![false, true, false, true]);
    assert_eq!(
        *events.borrow(),
        vec![
            status(DeviceClass::Fan, ActuatorState::On),
            status(DeviceClass::Fan, ActuatorState::Off),
            status(DeviceClass::Fan, ActuatorState::On),
        ]
    );
}

#[test]
fn failed_readback_is_reported_and_keeps_last_known() {
    let pin = MockRelayPin::default();
    let identity = ActuatorIdentity {
        pin: 26,
        polarity: Polarity::ActiveLow,
    };
    let mut relay = Relay::new(pin.clone(), identity).unwrap();

    pin.line.borrow_mut().fail_reads = true;
    assert_eq!(relay.get(), Err(ActuatorError::ReadFailed));
    assert_eq!(relay.set(ActuatorState::On), Err(ActuatorError::ReadFailed));
    assert_eq!(relay.last_known(), ActuatorState::Off);
    // The write itself went out before the readback failed.
    assert!(!pin.line.borrow().high);

    pin.line.borrow_mut().fail_reads = false;
    assert_eq!(relay.get(), Ok(ActuatorState::On));
}
