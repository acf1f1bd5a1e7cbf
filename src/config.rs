//! System configuration parameters
//!
//! Wiring, sampling cadence and bus topics for the EnvNode.
//! Defaults come from [`crate::pins`]; a stored copy in NVS overrides them.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::drivers::relay::{ActuatorIdentity, Polarity};
use crate::pins;
use crate::sensors::sht3x::BusParams;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sensors ---
    /// DHT11 open-drain data line.
    pub dht11_gpio: u8,
    /// SHT3x I²C bus.
    pub sht3x_bus: BusParams,

    // --- Actuators ---
    pub fan: ActuatorIdentity,
    pub humidifier: ActuatorIdentity,

    // --- Timing ---
    /// Sensor sample interval (milliseconds)
    pub sample_interval_ms: u32,

    // --- Bus topics ---
    /// Where readings are published.
    pub sensor_topic: heapless::String<64>,
    /// Where commands arrive.
    pub command_topic: heapless::String<64>,
    /// Where actuator status changes are published.
    pub status_topic: heapless::String<64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            dht11_gpio: pins::DHT11_DATA_GPIO,
            sht3x_bus: BusParams::default(),

            fan: ActuatorIdentity {
                pin: pins::FAN_RELAY_GPIO,
                polarity: Polarity::ActiveLow,
            },
            humidifier: ActuatorIdentity {
                pin: pins::HUMIDIFIER_RELAY_GPIO,
                polarity: Polarity::ActiveLow,
            },

            sample_interval_ms: 5_000,

            sensor_topic: topic("room_1/sensors"),
            command_topic: topic("room_1/commands"),
            status_topic: topic("room_1/status"),
        }
    }
}

/// An overlong literal becomes an empty topic, which `validate` rejects.
fn topic(s: &str) -> heapless::String<64> {
    heapless::String::try_from(s).unwrap_or_default()
}

impl SystemConfig {
    /// Range- and consistency-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let outputs = [self.dht11_gpio, self.fan.pin, self.humidifier.pin];
        if outputs
            .iter()
            .any(|&p| p >= pins::FIRST_INPUT_ONLY_GPIO)
        {
            return Err(ConfigError::ValidationFailed(
                "DHT11 and relay pins must be output-capable (< GPIO34)",
            ));
        }
        if self.sht3x_bus.sda_gpio >= pins::FIRST_INPUT_ONLY_GPIO
            || self.sht3x_bus.scl_gpio >= pins::FIRST_INPUT_ONLY_GPIO
        {
            return Err(ConfigError::ValidationFailed(
                "I2C pins must be output-capable (< GPIO34)",
            ));
        }

        let all = [
            self.dht11_gpio,
            self.fan.pin,
            self.humidifier.pin,
            self.sht3x_bus.sda_gpio,
            self.sht3x_bus.scl_gpio,
        ];
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].contains(a) {
                return Err(ConfigError::ValidationFailed(
                    "each GPIO may be assigned to one function only",
                ));
            }
        }

        if self.sht3x_bus.validate().is_err() {
            return Err(ConfigError::ValidationFailed(
                "sht3x_bus: address must be 7-bit and clock 1 Hz-1 MHz",
            ));
        }
        // DHT11 cannot sample faster than once per second.
        if !(1_000..=3_600_000).contains(&self.sample_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must be 1000-3600000",
            ));
        }
        if self.sensor_topic.is_empty()
            || self.command_topic.is_empty()
            || self.status_topic.is_empty()
        {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        Ok(())
    }
}
