//! Humidity/temperature sensor drivers.
//!
//! Two acquisition paths produce the same [`SensorReading`]:
//!
//! | Driver    | Link              | Integrity check            |
//! |-----------|-------------------|----------------------------|
//! | [`dht11`] | single-wire GPIO  | 8-bit additive checksum    |
//! | [`sht3x`] | I²C               | CRC-8 (0x31) per data word |
//!
//! Both own their bus exclusively (`&mut self` on every read), keep no
//! global state, and never turn an unverified frame into a reading.

pub mod crc;
pub mod dht11;
pub mod sht3x;

use serde::Serialize;

/// A verified humidity/temperature sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    #[serde(rename = "temperature")]
    pub temperature_celsius: f32,
    #[serde(rename = "humidity")]
    pub humidity_percent_rh: f32,
    /// Monotonic capture time in milliseconds.
    #[serde(rename = "timestamp")]
    pub captured_at_ms: u64,
}

/// Which acquisition path produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Dht11,
    Sht3x,
}

impl SensorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dht11 => "dht11",
            Self::Sht3x => "sht3x",
        }
    }
}
