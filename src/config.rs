//! Handler configuration
//!
//! Read from a JSON file:
//!
//! ```json
//! {
//!     "serialport": "/dev/ttyS5",
//!     "baudrate": 57600,
//!     "loglevel": "INFO"
//! }
//! ```
//!
//! Link timings default to [`DEFAULT_LINK_TIMINGS`] and can be overridden in
//! milliseconds (`settle_ms`, `message_delay_ms`, `read_timeout_ms`).

use std::path::Path;

use embassy_time::Duration;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::session::{DEFAULT_LINK_TIMINGS, LinkConfig, LinkTimings};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandlerConfig {
    #[serde(rename = "serialport")]
    pub serial_port: String,
    #[serde(rename = "baudrate")]
    pub baud_rate: u32,
    /// Default log filter, e.g. `INFO` or `debug`
    #[serde(rename = "loglevel", default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub settle_ms: Option<u64>,
    #[serde(default)]
    pub message_delay_ms: Option<u64>,
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl HandlerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MalformedCommand(format!("config: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::MalformedCommand(format!("config {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn timings(&self) -> LinkTimings {
        let ms = |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_millis);
        LinkTimings {
            settle: ms(self.settle_ms, DEFAULT_LINK_TIMINGS.settle),
            message_delay: ms(self.message_delay_ms, DEFAULT_LINK_TIMINGS.message_delay),
            read_timeout: ms(self.read_timeout_ms, DEFAULT_LINK_TIMINGS.read_timeout),
        }
    }

    pub fn link(&self) -> LinkConfig {
        LinkConfig::new(self.serial_port.clone(), self.baud_rate).with_timings(self.timings())
    }

    /// Log level in the lower-case form `tracing` filters expect.
    pub fn log_filter(&self) -> String {
        self.log_level.to_ascii_lowercase()
    }
}
