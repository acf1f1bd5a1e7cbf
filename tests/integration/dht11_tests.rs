//! DHT11 acquisition against a scripted open-drain line.

use envnode::error::DecodeError;
use envnode::sensors::dht11::{Dht11, EDGE_TIMEOUT_US, START_HOLD_US};

use crate::mock_hw::{FakeClock, Response, ScriptedLine, dht11_frame};

#[test]
fn decodes_a_valid_frame() {
    let clock = FakeClock::new();
    let line = ScriptedLine::dht11(&clock, dht11_frame(55, 0, 24, 3));
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    let reading = dht.read().unwrap();
    assert_eq!(reading.humidity_percent_rh, 55.0);
    assert_eq!(reading.temperature_celsius, 24.0 + 3.0 / 10.0);
    assert_eq!(dht.last_reading(), Some(reading));
}

#[test]
fn decodes_all_ones_and_all_zeros() {
    let clock = FakeClock::new();
    let line = ScriptedLine::new(
        &clock,
        [
            Response::dht11([0xFF, 0xFF, 0xFF, 0xFF, 0xFC]),
            Response::dht11([0, 0, 0, 0, 0]),
        ],
    );
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    let r = dht.read().unwrap();
    assert_eq!(r.humidity_percent_rh, 255.0 + 25.5);
    let r = dht.read().unwrap();
    assert_eq!(r.humidity_percent_rh, 0.0);
    assert_eq!(r.temperature_celsius, 0.0);
}

#[test]
fn start_pulse_holds_the_line_for_at_least_18ms() {
    let clock = FakeClock::new();
    let line = ScriptedLine::dht11(&clock, dht11_frame(40, 0, 20, 0));
    let holds = line.start_holds_us.clone();
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    dht.read().unwrap();
    let holds = holds.borrow();
    assert_eq!(holds.len(), 1);
    assert!(holds[0] >= 18_000, "start pulse was {} us", holds[0]);
    assert_eq!(holds[0], u64::from(START_HOLD_US));
}

#[test]
fn checksum_mismatch_keeps_previous_reading() {
    let clock = FakeClock::new();
    let mut bad = dht11_frame(60, 0, 23, 0);
    bad[4] ^= 0x01;
    let line = ScriptedLine::new(
        &clock,
        [Response::dht11(dht11_frame(50, 0, 22, 0)), Response::dht11(bad)],
    );
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    let first = dht.read().unwrap();
    assert_eq!(dht.read(), Err(DecodeError::ChecksumMismatch));
    assert_eq!(dht.last_reading(), Some(first));
}

#[test]
fn silent_line_reports_no_response_in_bounded_time() {
    let clock = FakeClock::new();
    let line = ScriptedLine::silent(&clock);
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    let before = clock.peek();
    assert_eq!(dht.read(), Err(DecodeError::NoResponse));
    let elapsed = clock.peek() - before;
    let bound = u64::from(START_HOLD_US) + 100 + 2 * EDGE_TIMEOUT_US;
    assert!(elapsed <= bound, "took {elapsed} us");
    assert_eq!(dht.last_reading(), None);
}

#[test]
fn line_stuck_mid_frame_reports_frame_timeout() {
    let clock = FakeClock::new();
    let line = ScriptedLine::new(
        &clock,
        [Response::stuck_after(dht11_frame(55, 0, 24, 3), 10)],
    );
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    assert_eq!(dht.read(), Err(DecodeError::FrameTimeout));
    assert_eq!(dht.last_reading(), None);
}

#[test]
fn recovers_after_a_failed_read() {
    let clock = FakeClock::new();
    let line = ScriptedLine::new(
        &clock,
        [Response::silent(), Response::dht11(dht11_frame(45, 0, 21, 5))],
    );
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    assert_eq!(dht.read(), Err(DecodeError::NoResponse));
    let r = dht.read().unwrap();
    assert_eq!(r.humidity_percent_rh, 45.0);
    assert_eq!(r.temperature_celsius, 21.5);
}

#[test]
fn pin_errors_report_line_fault_and_keep_previous_reading() {
    let clock = FakeClock::new();
    let line = ScriptedLine::new(
        &clock,
        [
            Response::dht11(dht11_frame(40, 0, 21, 5)),
            Response::dht11(dht11_frame(41, 0, 22, 0)),
        ],
    );
    let fail_reads = line.fail_reads.clone();
    let fail_writes = line.fail_writes.clone();
    let mut dht = Dht11::new(line, clock.clone(), clock.delay());

    let good = dht.read().unwrap();

    fail_reads.set(true);
    assert_eq!(dht.read(), Err(DecodeError::LineFault));
    assert_eq!(dht.last_reading(), Some(good));
    fail_reads.set(false);

    fail_writes.set(true);
    assert_eq!(dht.read(), Err(DecodeError::LineFault));
    assert_eq!(dht.last_reading(), Some(good));
}
