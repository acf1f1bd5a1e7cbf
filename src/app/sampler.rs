//! Periodic sampling policy.
//!
//! Decides *when* a sensor is read; the drivers only know *how*.  Runs
//! at a fixed rate (the next slot is anchored to the previous one, not
//! to when the read finished) and keeps the last verified reading.
//!
//! A failed acquisition withholds that cycle's publication and leaves
//! the cached reading alone.  There is no retry inside a cycle; the
//! next attempt is simply the next slot.

use log::warn;

use crate::error::Error;
use crate::sensors::SensorReading;

use super::events::AppEvent;
use super::ports::{EventSink, SensorPort};

pub struct Sampler {
    interval_ms: u64,
    /// `None` until the first poll, which is always due.
    next_due_ms: Option<u64>,
    last_good: Option<SensorReading>,
    consecutive_failures: u32,
}

impl Sampler {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms.max(1)),
            next_due_ms: None,
            last_good: None,
            consecutive_failures: 0,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_due_ms.is_none_or(|due| now_ms >= due)
    }

    /// Milliseconds to sleep before the next slot.
    pub fn ms_until_due(&self, now_ms: u64) -> u64 {
        self.next_due_ms
            .map_or(0, |due| due.saturating_sub(now_ms))
    }

    /// Read `sensor` if a slot is due and publish the result.
    ///
    /// Returns `None` when not due.
    pub fn poll(
        &mut self,
        now_ms: u64,
        sensor: &mut impl SensorPort,
        sink: &mut impl EventSink,
    ) -> Option<Result<SensorReading, Error>> {
        if !self.is_due(now_ms) {
            return None;
        }
        self.schedule_next(now_ms);

        let result = sensor.acquire();
        match result {
            Ok(reading) => {
                self.last_good = Some(reading);
                self.consecutive_failures = 0;
                sink.emit(&AppEvent::Reading {
                    source: sensor.kind(),
                    reading,
                });
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    "{}: sample withheld ({}), {} consecutive failure(s)",
                    sensor.kind().as_str(),
                    e,
                    self.consecutive_failures
                );
            }
        }
        Some(result)
    }

    /// Last reading that passed validation.
    pub fn last_good(&self) -> Option<SensorReading> {
        self.last_good
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn schedule_next(&mut self, now_ms: u64) {
        let anchored = self.next_due_ms.unwrap_or(now_ms) + self.interval_ms;
        // Fell more than a whole period behind: skip the missed slots.
        self.next_due_ms = Some(if anchored <= now_ms {
            now_ms + self.interval_ms
        } else {
            anchored
        });
    }
}
