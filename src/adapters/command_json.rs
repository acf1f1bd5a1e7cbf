//! JSON wire format for the command and publication topics.
//!
//! Inbound (`room_1/commands`):
//!
//! ```json
//! {"type": "fan", "state": "on"}
//! ```
//!
//! `type` is `fan` or `humidifier`, `state` is `on` or `off`, both
//! matched case-insensitively.  Unknown fields are ignored.
//!
//! Outbound readings (`room_1/sensors`):
//!
//! ```json
//! {"temperature": 24.3, "humidity": 55.0, "timestamp": 1234}
//! ```
//!
//! Outbound status (`room_1/status`) mirrors the command shape.

use core::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::commands::{Command, DeviceClass};
use crate::app::dispatcher::CommandQueue;
use crate::drivers::relay::ActuatorState;
use crate::error::QueueFull;
use crate::sensors::SensorReading;

/// Largest inbound payload accepted.
pub const MAX_PAYLOAD_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Payload exceeds [`MAX_PAYLOAD_LEN`].
    TooLong(usize),
    /// Not a JSON object with string `type` and `state` fields.
    Malformed,
    UnknownDevice,
    UnknownState,
    /// Parsed fine but the queue had no room.
    Rejected(QueueFull),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong(n) => write!(f, "payload too long ({n} bytes)"),
            Self::Malformed => write!(f, "malformed command payload"),
            Self::UnknownDevice => write!(f, "unknown device type"),
            Self::UnknownState => write!(f, "unknown state"),
            Self::Rejected(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for CommandError {}

impl From<QueueFull> for CommandError {
    fn from(e: QueueFull) -> Self {
        Self::Rejected(e)
    }
}

#[derive(Deserialize)]
struct RawCommand {
    #[serde(rename = "type")]
    device: String,
    state: String,
}

#[derive(Serialize)]
struct StatusPayload {
    #[serde(rename = "type")]
    device: DeviceClass,
    state: ActuatorState,
}

fn device_from_str(s: &str) -> Option<DeviceClass> {
    DeviceClass::ALL
        .into_iter()
        .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
}

fn state_from_str(s: &str) -> Option<ActuatorState> {
    [ActuatorState::On, ActuatorState::Off]
        .into_iter()
        .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
}

/// Parse one command payload.
pub fn parse_command(payload: &[u8]) -> Result<Command, CommandError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CommandError::TooLong(payload.len()));
    }
    let raw: RawCommand =
        serde_json::from_slice(payload).map_err(|_| CommandError::Malformed)?;

    let device = device_from_str(&raw.device).ok_or(CommandError::UnknownDevice)?;
    let state = state_from_str(&raw.state).ok_or(CommandError::UnknownState)?;
    Ok(Command::new(device, state))
}

/// Parse a payload and submit it to `queue`.
///
/// This is the inbound transport callback: it never blocks, and every
/// rejection is logged and returned.
pub fn handle_payload(queue: &CommandQueue, payload: &[u8]) -> Result<Command, CommandError> {
    let result = parse_command(payload).and_then(|cmd| {
        queue.submit(cmd)?;
        Ok(cmd)
    });
    match &result {
        Ok(cmd) => debug!(
            "cmd: queued {} -> {}",
            cmd.device_class.as_str(),
            cmd.desired_state.as_str()
        ),
        Err(e) => warn!("cmd: rejected: {}", e),
    }
    result
}

pub fn encode_reading(reading: &SensorReading) -> Result<String, serde_json::Error> {
    serde_json::to_string(reading)
}

pub fn encode_status(
    device: DeviceClass,
    state: ActuatorState,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StatusPayload { device, state })
}
