//! Sensirion SHT3x humidity/temperature sensor over I²C.
//!
//! Single-shot measurement, high repeatability, clock stretching enabled
//! (command `0x2C06`).  The sensor answers with two CRC-protected words:
//!
//! ```text
//!  [ T_msb, T_lsb, T_crc, RH_msb, RH_lsb, RH_crc ]
//! ```
//!
//! T  = -45 + 175 · raw / 65535   (°C)
//! RH = 100 · raw / 65535         (%RH)
//!
//! Bus transaction timeouts belong to the I²C driver; this client only
//! sequences write → conversion delay → read → verify.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{MonotonicClock, SensorPort};
use crate::error::{Error, InitError, MeasureError};
use crate::pins;

use super::crc::checked_word;
use super::{SensorKind, SensorReading};

/// Single shot, high repeatability, clock stretching.
pub const CMD_MEASURE_HIGH: u16 = 0x2C06;
/// Conversion wait before reading back.  Covers the 15.5 ms worst case.
pub const CONVERSION_DELAY_MS: u32 = 20;

pub const FRAME_LEN: usize = 6;

const MAX_CLOCK_HZ: u32 = 1_000_000;

/// I²C bus parameters for the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusParams {
    pub sda_gpio: u8,
    pub scl_gpio: u8,
    pub clock_hz: u32,
    /// 7-bit device address.
    pub address: u8,
}

impl Default for BusParams {
    fn default() -> Self {
        Self {
            sda_gpio: pins::I2C_SDA_GPIO,
            scl_gpio: pins::I2C_SCL_GPIO,
            clock_hz: pins::I2C_FREQ_HZ,
            address: pins::SHT3X_ADDR,
        }
    }
}

impl BusParams {
    pub fn validate(&self) -> Result<(), InitError> {
        if self.address > 0x7F {
            return Err(InitError::InvalidAddress(self.address));
        }
        if self.clock_hz == 0 || self.clock_hz > MAX_CLOCK_HZ {
            return Err(InitError::InvalidClock(self.clock_hz));
        }
        Ok(())
    }
}

pub struct Sht3x<I, D, C> {
    bus: I,
    delay: D,
    clock: C,
    address: u8,
    last_reading: Option<SensorReading>,
}

impl<I, D, C> Sht3x<I, D, C>
where
    I: I2c,
    D: DelayNs,
    C: MonotonicClock,
{
    /// Bind the client to an already configured bus.
    pub fn new(bus: I, delay: D, clock: C, params: BusParams) -> Result<Self, InitError> {
        params.validate()?;
        debug!(
            "sht3x: addr=0x{:02X} on SDA{}/SCL{} @ {} Hz",
            params.address, params.sda_gpio, params.scl_gpio, params.clock_hz
        );
        Ok(Self {
            bus,
            delay,
            clock,
            address: params.address,
            last_reading: None,
        })
    }

    /// Trigger one measurement and return the verified result.
    pub fn read(&mut self) -> Result<SensorReading, MeasureError> {
        let result = self.measure();
        match result {
            Ok(reading) => {
                debug!(
                    "sht3x: {:.2}\u{00b0}C {:.2}%RH",
                    reading.temperature_celsius, reading.humidity_percent_rh
                );
                self.last_reading = Some(reading);
            }
            Err(e) => warn!("sht3x: read failed: {}", e),
        }
        result
    }

    /// Most recent successful reading, if any.
    pub fn last_reading(&self) -> Option<SensorReading> {
        self.last_reading
    }

    /// Give the bus back (e.g. to share it with another device owner).
    pub fn release(self) -> I {
        self.bus
    }

    fn measure(&mut self) -> Result<SensorReading, MeasureError> {
        self.bus
            .write(self.address, &CMD_MEASURE_HIGH.to_be_bytes())
            .map_err(|e| MeasureError::BusWriteFailed(e.kind()))?;

        self.delay.delay_ms(CONVERSION_DELAY_MS);

        let mut frame = [0u8; FRAME_LEN];
        self.bus
            .read(self.address, &mut frame)
            .map_err(|e| MeasureError::BusReadFailed(e.kind()))?;

        decode_frame(&frame, self.clock.now_ms())
    }
}

impl<I, D, C> SensorPort for Sht3x<I, D, C>
where
    I: I2c,
    D: DelayNs,
    C: MonotonicClock,
{
    fn kind(&self) -> SensorKind {
        SensorKind::Sht3x
    }

    fn acquire(&mut self) -> Result<SensorReading, Error> {
        Ok(self.read()?)
    }
}

/// Verify both CRC words and convert to engineering units.
pub fn decode_frame(
    frame: &[u8; FRAME_LEN],
    captured_at_ms: u64,
) -> Result<SensorReading, MeasureError> {
    let raw_temp = checked_word(&[frame[0], frame[1], frame[2]]);
    let raw_hum = checked_word(&[frame[3], frame[4], frame[5]]);
    let (Some(raw_temp), Some(raw_hum)) = (raw_temp, raw_hum) else {
        return Err(MeasureError::ChecksumMismatch);
    };

    Ok(SensorReading {
        temperature_celsius: raw_to_celsius(raw_temp),
        humidity_percent_rh: raw_to_percent_rh(raw_hum),
        captured_at_ms,
    })
}

pub fn raw_to_celsius(raw: u16) -> f32 {
    -45.0 + 175.0 * f32::from(raw) / 65535.0
}

pub fn raw_to_percent_rh(raw: u16) -> f32 {
    100.0 * f32::from(raw) / 65535.0
}
