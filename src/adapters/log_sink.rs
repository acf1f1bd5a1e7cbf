//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event to the
//! serial log as the JSON payload an MQTT publisher would send, prefixed
//! with its topic.  A network publisher implements the same trait.

use log::{info, warn};

use crate::adapters::command_json;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::SystemConfig;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    sensor_topic: heapless::String<64>,
    status_topic: heapless::String<64>,
    published: u32,
}

impl LogEventSink {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sensor_topic: config.sensor_topic.clone(),
            status_topic: config.status_topic.clone(),
            published: 0,
        }
    }

    /// Number of payloads written so far.
    pub fn published(&self) -> u32 {
        self.published
    }

    fn publish(&mut self, topic: &str, payload: Result<String, serde_json::Error>) {
        match payload {
            Ok(json) => {
                self.published = self.published.wrapping_add(1);
                info!("PUB | {} | {}", topic, json);
            }
            Err(e) => warn!("PUB | {} | encode failed: {}", topic, e),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match *event {
            AppEvent::Reading { source, reading } => {
                let topic = self.sensor_topic.clone();
                info!(
                    "READ | {} | T={:.1}\u{00b0}C RH={:.1}%",
                    source.as_str(),
                    reading.temperature_celsius,
                    reading.humidity_percent_rh
                );
                self.publish(&topic, command_json::encode_reading(&reading));
            }
            AppEvent::StatusChanged { device, state } => {
                let topic = self.status_topic.clone();
                self.publish(&topic, command_json::encode_status(device, state));
            }
            AppEvent::Started { fan, humidifier } => {
                info!(
                    "START | fan={} humidifier={}",
                    fan.as_str(),
                    humidifier.as_str()
                );
            }
        }
    }
}
