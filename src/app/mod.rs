//! Application core: sampling policy and command dispatch.
//!
//! Everything here is hardware-agnostic.  Sensors and relays are reached
//! through `embedded-hal` traits and the port traits in [`ports`], so the
//! whole layer runs on the host against mocks.

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod sampler;
