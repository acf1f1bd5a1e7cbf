//! Relay actuator driver (fan, humidifier).
//!
//! Each relay is a two-state machine over one GPIO.  The caller always
//! speaks logical [`ActuatorState`]; the configured [`Polarity`] maps it
//! to the electrical level.  The state reported back is never the value
//! that was written: it is read from the line after the write, so a
//! stuck driver or a miswired board shows up as a mismatch instead of
//! being papered over.
//!
//! ## Pin capability
//!
//! The pin must be both [`OutputPin`] and [`InputPin`].  On ESP-IDF that
//! is a `PinDriver` in input-output mode; on the host it is a mock.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ActuatorError, InitError};

/// Logical actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorState {
    Off,
    On,
}

impl ActuatorState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// The opposite state.
    #[must_use]
    pub fn complement(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }
}

/// Which electrical level energises the relay coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Electrical level (`true` = HIGH) that realises `state`.
    pub fn level_for(self, state: ActuatorState) -> bool {
        state.is_on() != matches!(self, Self::ActiveLow)
    }

    /// Logical state implied by an observed electrical level.
    pub fn state_for(self, high: bool) -> ActuatorState {
        if high != matches!(self, Self::ActiveLow) {
            ActuatorState::On
        } else {
            ActuatorState::Off
        }
    }
}

/// Static wiring of one actuator: which pin, which polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorIdentity {
    pub pin: u8,
    pub polarity: Polarity,
}

pub struct Relay<P> {
    pin: P,
    identity: ActuatorIdentity,
    /// Last state confirmed by a successful write + readback.
    last_known: ActuatorState,
}

impl<P> Relay<P>
where
    P: OutputPin + InputPin,
{
    /// Take ownership of `pin` and force the relay OFF.
    ///
    /// The relay is never exposed in an undetermined state: if the
    /// initial write fails, no `Relay` is produced.
    pub fn new(pin: P, identity: ActuatorIdentity) -> Result<Self, InitError> {
        let mut relay = Self {
            pin,
            identity,
            last_known: ActuatorState::Off,
        };
        relay.set(ActuatorState::Off).map_err(InitError::Actuator)?;
        debug!(
            "relay GPIO{} ready ({:?}), forced off",
            identity.pin, identity.polarity
        );
        Ok(relay)
    }

    /// Drive the relay towards `desired` and return the observed state.
    ///
    /// A write failure is reported without retrying and leaves
    /// [`last_known`](Self::last_known) untouched.
    pub fn set(&mut self, desired: ActuatorState) -> Result<ActuatorState, ActuatorError> {
        let high = self.identity.polarity.level_for(desired);
        let written = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if written.is_err() {
            warn!("relay GPIO{}: write {:?} failed", self.identity.pin, desired);
            return Err(ActuatorError::WriteFailed);
        }

        let observed = self.get()?;
        if observed != desired {
            warn!(
                "relay GPIO{}: requested {:?}, line reads {:?}",
                self.identity.pin, desired, observed
            );
        }
        self.last_known = observed;
        Ok(observed)
    }

    /// Read the line and translate it through the polarity.
    pub fn get(&mut self) -> Result<ActuatorState, ActuatorError> {
        let high = self.pin.is_high().map_err(|_| ActuatorError::ReadFailed)?;
        Ok(self.identity.polarity.state_for(high))
    }

    /// Read the current state and drive the complement.
    pub fn toggle(&mut self) -> Result<ActuatorState, ActuatorError> {
        let current = self.get()?;
        self.set(current.complement())
    }

    pub fn identity(&self) -> ActuatorIdentity {
        self.identity
    }

    /// Last state confirmed by [`set`](Self::set).  Starts at the
    /// state `new` forced and read back.
    pub fn last_known(&self) -> ActuatorState {
        self.last_known
    }
}
