//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ sensors / dispatcher (domain)
//! ```
//!
//! GPIO, I²C and delays come straight from `embedded-hal`; the ports
//! below cover what `embedded-hal` does not: a monotonic time source,
//! the outbound event stream, sensor sampling, and config persistence.

use crate::config::SystemConfig;
use crate::error::Error;
use crate::sensors::{SensorKind, SensorReading};

// ───────────────────────────────────────────────────────────────
// Monotonic clock (driven adapter: timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond time source.
///
/// Protocol waits are expressed as "poll until condition or deadline"
/// against this clock, so they can be driven by a fake clock in tests.
pub trait MonotonicClock {
    /// Microseconds since an arbitrary fixed origin.  Never decreases.
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One acquisition from any humidity/temperature sensor.
pub trait SensorPort {
    fn kind(&self) -> SensorKind;

    /// Run one full acquisition.  Blocks for the protocol duration.
    fn acquire(&mut self) -> Result<SensorReading, Error>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → publisher)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}
