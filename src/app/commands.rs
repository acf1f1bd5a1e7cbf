//! Inbound commands to the dispatcher.
//!
//! A [`Command`] is already parsed and validated when it reaches the
//! core.  Text payloads are turned into commands by the JSON adapter
//! ([`crate::adapters::command_json`]).

use serde::{Deserialize, Serialize};

use crate::drivers::relay::ActuatorState;

/// Actuator classes the node can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Fan,
    Humidifier,
}

impl DeviceClass {
    pub const COUNT: usize = 2;
    pub const ALL: [Self; Self::COUNT] = [Self::Fan, Self::Humidifier];

    /// Dense index for fixed-size routing tables.
    pub const fn index(self) -> usize {
        match self {
            Self::Fan => 0,
            Self::Humidifier => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fan => "fan",
            Self::Humidifier => "humidifier",
        }
    }
}

/// Request to drive one actuator class to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub device_class: DeviceClass,
    pub desired_state: ActuatorState,
}

impl Command {
    pub const fn new(device_class: DeviceClass, desired_state: ActuatorState) -> Self {
        Self {
            device_class,
            desired_state,
        }
    }
}
