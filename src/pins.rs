//! GPIO / peripheral pin assignments for the EnvNode board.
//!
//! Single source of truth for the default wiring.  [`SystemConfig`]
//! seeds its pin fields from here; a stored config may override them.
//!
//! [`SystemConfig`]: crate::config::SystemConfig

// ---------------------------------------------------------------------------
// Single-wire humidity/temperature sensor (DHT11)
// ---------------------------------------------------------------------------

/// Open-drain data line with the internal pull-up enabled.
pub const DHT11_DATA_GPIO: u8 = 4;

// ---------------------------------------------------------------------------
// I²C bus (SHT3x)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: u8 = 21;
pub const I2C_SCL_GPIO: u8 = 22;
/// Standard-mode clock.
pub const I2C_FREQ_HZ: u32 = 100_000;
/// SHT3x with ADDR pin tied low.
pub const SHT3X_ADDR: u8 = 0x44;

// ---------------------------------------------------------------------------
// Relay outputs
// ---------------------------------------------------------------------------

/// Fan relay coil driver.  The common opto-isolated relay boards pull
/// the coil in on LOW.
pub const FAN_RELAY_GPIO: u8 = 25;
/// Humidifier relay coil driver (same board, channel 2).
pub const HUMIDIFIER_RELAY_GPIO: u8 = 26;

/// Lowest GPIO that is input-only; relays and the single-wire line need output.
pub const FIRST_INPUT_ONLY_GPIO: u8 = 34;
