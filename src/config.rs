// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for the device link and the reader loop.
//!
//! Defaults match the reference firmware: 9600 baud on the first USB CDC
//! port, a one-second read timeout, and a half-second pause after a failed
//! read.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use ldrlink::config::{BridgeConfig, LinkConfig, ReaderConfig};
//!
//! let config = BridgeConfig::new(LinkConfig::new("/dev/ttyUSB0").with_baud_rate(115_200))
//!     .with_reader(ReaderConfig::default().with_error_backoff(Duration::from_secs(1)));
//!
//! assert_eq!(config.link.baud_rate, 115_200);
//! assert_eq!(config.reader.error_backoff, Duration::from_secs(1));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::framing::DEFAULT_MAX_LINE_LENGTH;

/// Environment variable overriding the serial port path.
pub const ENV_SERIAL_PORT: &str = "SERIAL_PORT";
/// Environment variable overriding the baud rate.
pub const ENV_SERIAL_BAUD: &str = "SERIAL_BAUD";

/// Serial port used when none is configured.
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM5";
/// Serial port used when none is configured.
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Baud rate of the reference firmware.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Settings of the physical link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial port path (e.g. `/dev/ttyACM0`, `COM3`).
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Upper bound on a single blocking read.
    #[serde(with = "duration_ms")]
    pub read_timeout: Duration,
    /// Upper bound on writing one command.
    #[serde(with = "duration_ms")]
    pub write_timeout: Duration,
}

impl LinkConfig {
    /// Creates a configuration for `port` with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Builds a configuration from `SERIAL_PORT` and `SERIAL_BAUD`, falling
    /// back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `SERIAL_BAUD` is set but not a number.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(port) = lookup(ENV_SERIAL_PORT).filter(|p| !p.trim().is_empty()) {
            config.port = port.trim().to_string();
        }
        if let Some(baud) = lookup(ENV_SERIAL_BAUD) {
            config.baud_rate = baud
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_SERIAL_BAUD} is not a number: {baud}")))?;
        }

        Ok(config)
    }

    /// Sets the baud rate.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(2),
        }
    }
}

/// Settings of the reader loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Size of the buffer handed to each read.
    pub read_buffer_size: usize,
    /// Pause after a read that returned nothing.
    #[serde(with = "duration_ms")]
    pub idle_pause: Duration,
    /// Pause after a failed read before retrying.
    #[serde(with = "duration_ms")]
    pub error_backoff: Duration,
    /// Stop after this many failed reads in a row. `None` retries forever.
    pub max_consecutive_errors: Option<u32>,
    /// Lines longer than this many bytes are dropped.
    pub max_line_length: usize,
}

impl ReaderConfig {
    /// Sets the idle pause.
    #[must_use]
    pub fn with_idle_pause(mut self, pause: Duration) -> Self {
        self.idle_pause = pause;
        self
    }

    /// Sets the pause after a failed read.
    #[must_use]
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Stops the reader after `limit` consecutive failed reads.
    #[must_use]
    pub fn with_max_consecutive_errors(mut self, limit: u32) -> Self {
        self.max_consecutive_errors = Some(limit);
        self
    }

    /// Sets the read buffer size. Zero is raised to one.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Sets the line length limit.
    #[must_use]
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 256,
            idle_pause: Duration::from_millis(10),
            error_backoff: Duration::from_millis(500),
            max_consecutive_errors: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Complete configuration of a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Link settings.
    pub link: LinkConfig,
    /// Reader loop settings.
    pub reader: ReaderConfig,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            reader: ReaderConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl BridgeConfig {
    /// Creates a configuration around `link` with default reader settings.
    #[must_use]
    pub fn new(link: LinkConfig) -> Self {
        Self {
            link,
            ..Self::default()
        }
    }

    /// Sets the reader loop settings.
    #[must_use]
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Sets the event channel capacity. Zero is raised to one.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        // Safe: configured timeouts never approach u64::MAX milliseconds
        #[allow(clippy::cast_possible_truncation)]
        let ms = value.as_millis() as u64;
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_firmware() {
        let link = LinkConfig::default();
        assert_eq!(link.port, DEFAULT_PORT);
        assert_eq!(link.baud_rate, 9600);
        assert_eq!(link.read_timeout, Duration::from_secs(1));

        let reader = ReaderConfig::default();
        assert_eq!(reader.idle_pause, Duration::from_millis(10));
        assert_eq!(reader.error_backoff, Duration::from_millis(500));
        assert_eq!(reader.max_consecutive_errors, None);
    }

    #[test]
    fn env_overrides_port_and_baud() {
        let config = LinkConfig::from_lookup(lookup_from(&[
            ("SERIAL_PORT", " COM3 "),
            ("SERIAL_BAUD", "115200"),
        ]))
        .unwrap();
        assert_eq!(config.port, "COM3");
        assert_eq!(config.baud_rate, 115_200);
    }

    #[test]
    fn env_blank_port_keeps_default() {
        let config = LinkConfig::from_lookup(lookup_from(&[("SERIAL_PORT", "  ")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn env_bad_baud_is_rejected() {
        let result = LinkConfig::from_lookup(lookup_from(&[("SERIAL_BAUD", "fast")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let json = r#"{
            "link": {"port": "/dev/ttyUSB1", "read_timeout": 5000},
            "reader": {"error_backoff": 250}
        }"#;
        let config: BridgeConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.link.port, "/dev/ttyUSB1");
        assert_eq!(config.link.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.link.read_timeout, Duration::from_secs(5));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.reader.error_backoff, Duration::from_millis(250));
        assert_eq!(config.reader.idle_pause, Duration::from_millis(10));
    }

    #[test]
    fn serializes_durations_as_milliseconds() {
        let json = serde_json::to_value(LinkConfig::default()).unwrap();
        assert_eq!(json["read_timeout"], 1000);
        assert_eq!(json["write_timeout"], 2000);
    }

    #[test]
    fn zero_buffer_size_is_raised() {
        let reader = ReaderConfig::default().with_read_buffer_size(0);
        assert_eq!(reader.read_buffer_size, 1);
    }
}
