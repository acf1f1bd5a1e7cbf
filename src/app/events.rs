//! Outbound application events.
//!
//! The sampler and the actuator workers emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, MQTT).

use crate::app::commands::DeviceClass;
use crate::drivers::relay::ActuatorState;
use crate::sensors::{SensorKind, SensorReading};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// A verified sensor reading, ready for publication.
    Reading {
        source: SensorKind,
        reading: SensorReading,
    },

    /// The observed state of an actuator changed.
    StatusChanged {
        device: DeviceClass,
        state: ActuatorState,
    },

    /// The node finished bring-up; carries the observed actuator states.
    Started {
        fan: ActuatorState,
        humidifier: ActuatorState,
    },
}
