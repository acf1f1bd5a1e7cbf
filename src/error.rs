//! Unified error types for the EnvNode firmware.
//!
//! Each subsystem owns a small `Copy` error enum that names exactly the
//! failures it can produce.  They all convert into the top-level [`Error`]
//! so a task loop can log any failure through one type.
//!
//! The four failure categories stay distinguishable all the way up:
//! timing (no response, mid-frame timeout), integrity (checksum / CRC),
//! resource (GPIO or bus primitive errors) and capacity (queue full).

use core::fmt;

use embedded_hal::i2c::ErrorKind as BusErrorKind;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Single-wire sensor acquisition failed.
    Decode(DecodeError),
    /// Two-wire sensor measurement failed.
    Measure(MeasureError),
    /// A relay write or readback failed.
    Actuator(ActuatorError),
    /// The command queue rejected a submission.
    QueueFull(QueueFull),
    /// Peripheral initialisation failed.
    Init(InitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "single-wire: {e}"),
            Self::Measure(e) => write!(f, "two-wire: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::QueueFull(e) => write!(f, "dispatch: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Single-wire decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The sensor never acknowledged the start condition.
    NoResponse,
    /// An edge inside the 40-bit data phase did not arrive in time.
    FrameTimeout,
    /// The additive checksum byte did not match the payload.
    ChecksumMismatch,
    /// The GPIO capability itself reported an error.
    LineFault,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no response from sensor"),
            Self::FrameTimeout => write!(f, "timeout inside data frame"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::LineFault => write!(f, "data line GPIO error"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Two-wire measurement errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureError {
    /// The measurement-command write transaction failed.
    BusWriteFailed(BusErrorKind),
    /// The 6-byte read transaction failed.
    BusReadFailed(BusErrorKind),
    /// A CRC-8 word check failed.
    ChecksumMismatch,
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusWriteFailed(kind) => write!(f, "bus write failed: {kind}"),
            Self::BusReadFailed(kind) => write!(f, "bus read failed: {kind}"),
            Self::ChecksumMismatch => write!(f, "CRC mismatch"),
        }
    }
}

impl From<MeasureError> for Error {
    fn from(e: MeasureError) -> Self {
        Self::Measure(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    WriteFailed,
    /// GPIO level readback failed.
    ReadFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "GPIO write failed"),
            Self::ReadFailed => write!(f, "GPIO read failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Dispatch capacity
// ---------------------------------------------------------------------------

/// The bounded command queue had no free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command queue full")
    }
}

impl From<QueueFull> for Error {
    fn from(e: QueueFull) -> Self {
        Self::QueueFull(e)
    }
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// Two-wire device address does not fit in 7 bits.
    InvalidAddress(u8),
    /// Two-wire clock outside the supported range.
    InvalidClock(u32),
    /// The relay could not be forced to its initial OFF state.
    Actuator(ActuatorError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(addr) => write!(f, "invalid bus address 0x{addr:02X}"),
            Self::InvalidClock(hz) => write!(f, "invalid bus clock {hz} Hz"),
            Self::Actuator(e) => write!(f, "relay: {e}"),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

impl core::error::Error for Error {}
impl core::error::Error for DecodeError {}
impl core::error::Error for MeasureError {}
impl core::error::Error for ActuatorError {}
impl core::error::Error for QueueFull {}
impl core::error::Error for InitError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
