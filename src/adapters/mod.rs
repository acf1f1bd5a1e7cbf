//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `command_json` | (inbound codec)    | JSON command / status topics |
//! | `i2c_bus`      | embedded-hal I2c   | ESP-IDF I2C driver, bounded  |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `nvs`          | ConfigPort         | NVS / in-memory store        |
//! | `time`         | MonotonicClock     | ESP32 high-resolution timer  |

pub mod command_json;
pub mod i2c_bus;
pub mod log_sink;
pub mod nvs;
pub mod time;
