//! Command dispatch: bounded queue → per-actuator mailbox → relay.
//!
//! ```text
//!  transport callback ──submit──▶ ┌──────────────┐
//!  transport callback ──submit──▶ │ CommandQueue │ (FIFO, depth 10)
//!                                 └──────┬───────┘
//!                                        │ one consumer
//!                                 ┌──────▼───────┐
//!                                 │  Dispatcher  │ routes by DeviceClass
//!                                 └──┬────────┬──┘
//!                   ActuatorHandle   │        │   ActuatorHandle
//!                   (latest wins)    ▼        ▼   (latest wins)
//!                          ActuatorWorker  ActuatorWorker
//!                            (fan relay)   (humidifier relay)
//! ```
//!
//! The queue preserves submission order.  The hop from dispatcher to
//! worker is a single-slot signal.  On a shared executor the dispatcher
//! yields after each command, so a burst reaches the relay one state at
//! a time.  A worker that falls behind on another thread sees a newer
//! desired state overwrite the pending one and ends on the most recent
//! request.  Intermediate states may be skipped; nothing is
//! queued twice.
//!
//! Workers emit [`AppEvent::StatusChanged`] only when the state read
//! back from the line differs from the last one they reported, so
//! repeating a command does not repeat the status publication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};

use crate::drivers::relay::{ActuatorState, Relay};
use crate::error::{ActuatorError, QueueFull};

use super::commands::{Command, DeviceClass};
use super::events::AppEvent;
use super::ports::EventSink;

/// Capacity of the inbound command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 10;

// ───────────────────────────────────────────────────────────────
// CommandQueue
// ───────────────────────────────────────────────────────────────

/// Bounded multi-producer FIFO feeding exactly one [`Dispatcher`].
pub struct CommandQueue {
    channel: Channel<CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>,
}

impl CommandQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without waiting.  A full queue is reported to the caller,
    /// which decides whether to drop or back off.
    pub fn submit(&self, cmd: Command) -> Result<(), QueueFull> {
        self.channel.try_send(cmd).map_err(|_| {
            warn!(
                "dispatch: queue full, rejecting {} -> {}",
                cmd.device_class.as_str(),
                cmd.desired_state.as_str()
            );
            QueueFull
        })
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ActuatorHandle
// ───────────────────────────────────────────────────────────────

/// Single-slot "latest wins" mailbox carrying the desired state to the
/// task that owns one relay.
pub struct ActuatorHandle {
    desired: Signal<CriticalSectionRawMutex, ActuatorState>,
}

impl ActuatorHandle {
    pub const fn new() -> Self {
        Self {
            desired: Signal::new(),
        }
    }

    /// Post a desired state, overwriting any value not yet taken.
    pub fn notify(&self, state: ActuatorState) {
        self.desired.signal(state);
    }

    /// Wait for the next desired state.
    pub async fn wait(&self) -> ActuatorState {
        self.desired.wait().await
    }

    /// Take the pending desired state without waiting.
    pub fn take_pending(&self) -> Option<ActuatorState> {
        self.desired.try_take()
    }

    pub fn is_pending(&self) -> bool {
        self.desired.signaled()
    }
}

impl Default for ActuatorHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Dispatcher
// ───────────────────────────────────────────────────────────────

/// The single consumer of a [`CommandQueue`].
pub struct Dispatcher<'a> {
    queue: &'a CommandQueue,
    routes: [Option<&'a ActuatorHandle>; DeviceClass::COUNT],
    dropped: u32,
}

impl<'a> Dispatcher<'a> {
    pub fn new(queue: &'a CommandQueue) -> Self {
        Self {
            queue,
            routes: [None; DeviceClass::COUNT],
            dropped: 0,
        }
    }

    /// Bind `class` to `handle`, returning the previous binding.
    pub fn register(
        &mut self,
        class: DeviceClass,
        handle: &'a ActuatorHandle,
    ) -> Option<&'a ActuatorHandle> {
        info!("dispatch: {} registered", class.as_str());
        self.routes[class.index()].replace(handle)
    }

    /// Route one command.  Returns `false` if nothing is registered for
    /// its class; the command is logged and dropped.
    pub fn dispatch(&mut self, cmd: Command) -> bool {
        match self.routes[cmd.device_class.index()] {
            Some(handle) => {
                debug!(
                    "dispatch: {} -> {}",
                    cmd.device_class.as_str(),
                    cmd.desired_state.as_str()
                );
                handle.notify(cmd.desired_state);
                true
            }
            None => {
                warn!(
                    "dispatch: no actuator registered for {}, dropping",
                    cmd.device_class.as_str()
                );
                self.dropped = self.dropped.saturating_add(1);
                false
            }
        }
    }

    /// Wait for the next queued command and route it.
    ///
    /// Yields once after routing so a worker sharing this executor takes
    /// the posted state before the next command can overwrite it.
    pub async fn dispatch_next(&mut self) -> bool {
        let cmd = self.queue.channel.receive().await;
        let routed = self.dispatch(cmd);
        futures_lite::future::yield_now().await;
        routed
    }

    /// Route everything currently queued without waiting.  Returns the
    /// number of commands taken off the queue.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut taken = 0;
        while let Ok(cmd) = self.queue.channel.try_receive() {
            self.dispatch(cmd);
            taken += 1;
        }
        taken
    }

    /// Consume commands forever.
    pub async fn run(&mut self) {
        info!("dispatch: running");
        loop {
            self.dispatch_next().await;
        }
    }

    /// Commands dropped because their class had no registered actuator.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

// ───────────────────────────────────────────────────────────────
// ActuatorWorker
// ───────────────────────────────────────────────────────────────

/// Owns one relay and applies desired states posted to its handle.
pub struct ActuatorWorker<P> {
    device: DeviceClass,
    relay: Relay<P>,
    last_reported: ActuatorState,
}

impl<P> ActuatorWorker<P>
where
    P: OutputPin + InputPin,
{
    /// Seed the reported state from the line so bring-up is not
    /// published as a change.
    pub fn new(device: DeviceClass, mut relay: Relay<P>) -> Result<Self, ActuatorError> {
        let observed = relay.get()?;
        Ok(Self {
            device,
            relay,
            last_reported: observed,
        })
    }

    /// Drive the relay to `desired`, read it back, and publish the
    /// observed state if it differs from the last one published.
    pub fn apply(
        &mut self,
        desired: ActuatorState,
        sink: &mut impl EventSink,
    ) -> Result<ActuatorState, ActuatorError> {
        self.relay.set(desired)?;
        let observed = self.relay.get()?;

        if observed != self.last_reported {
            info!(
                "{}: {} -> {}",
                self.device.as_str(),
                self.last_reported.as_str(),
                observed.as_str()
            );
            self.last_reported = observed;
            sink.emit(&AppEvent::StatusChanged {
                device: self.device,
                state: observed,
            });
        }
        Ok(observed)
    }

    /// Apply the pending desired state, if one was posted.
    pub fn apply_pending(
        &mut self,
        handle: &ActuatorHandle,
        sink: &mut impl EventSink,
    ) -> Option<Result<ActuatorState, ActuatorError>> {
        handle
            .take_pending()
            .map(|desired| self.apply(desired, sink))
    }

    /// Wait on `handle` and apply every desired state it delivers.
    pub async fn run(&mut self, handle: &ActuatorHandle, sink: &mut impl EventSink) {
        info!("{}: worker running", self.device.as_str());
        loop {
            let desired = handle.wait().await;
            if let Err(e) = self.apply(desired, sink) {
                warn!("{}: apply {} failed: {}", self.device.as_str(), desired.as_str(), e);
            }
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    /// State most recently published for this actuator.
    pub fn reported_state(&self) -> ActuatorState {
        self.last_reported
    }

    pub fn relay_mut(&mut self) -> &mut Relay<P> {
        &mut self.relay
    }
}
