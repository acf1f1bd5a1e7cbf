//! DHT11 single-wire humidity/temperature sensor.
//!
//! The host pulls the open-drain data line low for ≥ 18 ms, releases it,
//! and the sensor answers with an 80 µs low / 80 µs high preamble
//! followed by 40 data bits.  Every bit starts with ~50 µs low; the
//! length of the following high pulse carries the value (26–28 µs = 0,
//! ~70 µs = 1).
//!
//! ```text
//!  host  ‾‾‾\________ 20ms ________/‾‾ 30µs ‾‾\
//!  dht                                         \__ 80 __/‾‾ 80 ‾‾\__ 50 __/‾ 26|70 ‾\__ ...
//! ```
//!
//! The whole exchange takes ~4–5 ms after the start hold, too short to
//! hand over to the scheduler, so each edge is polled against a
//! monotonic deadline.  No wait is unbounded.
//!
//! Frame layout: `[hum_int, hum_frac, temp_int, temp_frac, checksum]`
//! where `checksum = (b0 + b1 + b2 + b3) mod 256`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::app::ports::{MonotonicClock, SensorPort};
use crate::error::{DecodeError, Error};

use super::{SensorKind, SensorReading};

/// Host start condition hold time.  The sensor needs at least 18 ms.
pub const START_HOLD_US: u32 = 20_000;
/// High time after releasing the line, inside the 20–40 µs window.
pub const RELEASE_US: u32 = 30;
/// Upper bound for every edge wait once the line is released.
pub const EDGE_TIMEOUT_US: u64 = 1_000;
/// High pulses longer than this decode as `1`.
pub const ONE_THRESHOLD_US: u64 = 50;

pub const FRAME_LEN: usize = 5;
const FRAME_BITS: usize = FRAME_LEN * 8;

/// Why a single edge wait ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitError {
    Timeout,
    Pin,
}

impl WaitError {
    /// Map a wait failure to the decode error of the current phase.
    fn during(self, phase: DecodeError) -> DecodeError {
        match self {
            Self::Timeout => phase,
            Self::Pin => DecodeError::LineFault,
        }
    }
}

pub struct Dht11<P, C, D> {
    pin: P,
    clock: C,
    delay: D,
    last_reading: Option<SensorReading>,
}

impl<P, C, D> Dht11<P, C, D>
where
    P: InputPin + OutputPin,
    C: MonotonicClock,
    D: DelayNs,
{
    /// `pin` must be configured open-drain with a pull-up so that driving
    /// it high releases the line to the sensor.
    pub fn new(pin: P, clock: C, delay: D) -> Self {
        Self {
            pin,
            clock,
            delay,
            last_reading: None,
        }
    }

    /// Run one complete acquisition.
    ///
    /// On any failure the previous [`last_reading`](Self::last_reading)
    /// is left as it was and nothing is returned but the error.
    pub fn read(&mut self) -> Result<SensorReading, DecodeError> {
        let result = self
            .acquire_frame()
            .and_then(|frame| decode_frame(&frame, self.clock.now_ms()));

        match result {
            Ok(reading) => {
                debug!(
                    "dht11: {:.1}\u{00b0}C {:.1}%RH",
                    reading.temperature_celsius, reading.humidity_percent_rh
                );
                self.last_reading = Some(reading);
            }
            Err(e) => warn!("dht11: read failed: {}", e),
        }
        result
    }

    /// Most recent successful reading, if any.
    pub fn last_reading(&self) -> Option<SensorReading> {
        self.last_reading
    }

    fn acquire_frame(&mut self) -> Result<[u8; FRAME_LEN], DecodeError> {
        self.send_start()?;

        // Acknowledge: sensor pulls low, then high, then low again.
        self.wait_for(false)
            .map_err(|e| e.during(DecodeError::NoResponse))?;
        self.wait_for(true)
            .map_err(|e| e.during(DecodeError::NoResponse))?;
        self.wait_for(false)
            .map_err(|e| e.during(DecodeError::NoResponse))?;

        let mut frame = [0u8; FRAME_LEN];
        for bit in 0..FRAME_BITS {
            let rise = self
                .wait_for(true)
                .map_err(|e| e.during(DecodeError::FrameTimeout))?;
            let fall = self
                .wait_for(false)
                .map_err(|e| e.during(DecodeError::FrameTimeout))?;

            if fall.saturating_sub(rise) > ONE_THRESHOLD_US {
                frame[bit / 8] |= 1 << (7 - (bit % 8));
            }
        }
        Ok(frame)
    }

    fn send_start(&mut self) -> Result<(), DecodeError> {
        self.pin.set_low().map_err(|_| DecodeError::LineFault)?;
        self.delay.delay_us(START_HOLD_US);
        // Open-drain: driving high releases the line, the pin is now an input.
        self.pin.set_high().map_err(|_| DecodeError::LineFault)?;
        self.delay.delay_us(RELEASE_US);
        Ok(())
    }

    /// Poll until the line reads `high`, returning the time it was seen.
    fn wait_for(&mut self, high: bool) -> Result<u64, WaitError> {
        let start = self.clock.now_us();
        loop {
            let level = self.pin.is_high().map_err(|_| WaitError::Pin)?;
            let now = self.clock.now_us();
            if level == high {
                return Ok(now);
            }
            if now.saturating_sub(start) >= EDGE_TIMEOUT_US {
                return Err(WaitError::Timeout);
            }
        }
    }
}

impl<P, C, D> SensorPort for Dht11<P, C, D>
where
    P: InputPin + OutputPin,
    C: MonotonicClock,
    D: DelayNs,
{
    fn kind(&self) -> SensorKind {
        SensorKind::Dht11
    }

    fn acquire(&mut self) -> Result<SensorReading, Error> {
        Ok(self.read()?)
    }
}

/// Additive checksum over the four payload bytes, truncated to 8 bits.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Validate a raw frame and convert it to engineering units.
pub fn decode_frame(
    frame: &[u8; FRAME_LEN],
    captured_at_ms: u64,
) -> Result<SensorReading, DecodeError> {
    if checksum(&frame[..4]) != frame[4] {
        return Err(DecodeError::ChecksumMismatch);
    }
    Ok(SensorReading {
        humidity_percent_rh: f32::from(frame[0]) + f32::from(frame[1]) / 10.0,
        temperature_celsius: f32::from(frame[2]) + f32::from(frame[3]) / 10.0,
        captured_at_ms,
    })
}
