// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device command definitions and the command channel.
//!
//! A command is a single text token followed by `\n`. The firmware knows a
//! small fixed vocabulary ([`DeviceCommand`]) but the channel forwards any
//! non-empty token unchanged; the device ignores what it does not know.
//!
//! # Available Commands
//!
//! | Command | Wire token | Effect |
//! |---------|-----------|--------|
//! | [`DeviceCommand::MonitorOn`] | `MONITOR_ON` | Enable light monitoring |
//! | [`DeviceCommand::MonitorOff`] | `MONITOR_OFF` | Disable light monitoring |
//! | [`DeviceCommand::AlarmOn`] | `ALARM_ON` | Enable the alarm output |
//! | [`DeviceCommand::AlarmOff`] | `ALARM_OFF` | Disable the alarm output |
//! | [`DeviceCommand::StatusQuery`] | `STATUS?` | Request a `STATUS` line |
//!
//! # Examples
//!
//! ```
//! use ldrlink::command::{Command, DeviceCommand};
//!
//! let cmd = Command::new("  ALARM_OFF ").unwrap();
//! assert_eq!(cmd.as_str(), "ALARM_OFF");
//! assert_eq!(cmd.to_wire(), b"ALARM_OFF\n");
//!
//! assert_eq!(Command::from(DeviceCommand::StatusQuery).as_str(), "STATUS?");
//! assert!(Command::new(" \t ").is_err());
//! ```

mod channel;

pub use channel::CommandChannel;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// A validated command token: trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    /// Validates `text` as a command.
    ///
    /// Surrounding whitespace is removed. Interior characters are kept as
    /// given.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Empty` if nothing is left after trimming.
    pub fn new(text: &str) -> Result<Self, CommandError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CommandError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the command token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the bytes written to the link: the token and a `\n`.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.0.len() + 1);
        wire.extend_from_slice(self.0.as_bytes());
        wire.push(b'\n');
        wire
    }

    /// Returns the known command this token names, if any.
    #[must_use]
    pub fn known(&self) -> Option<DeviceCommand> {
        self.0.parse().ok()
    }

    /// Consumes the command and returns the token.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<DeviceCommand> for Command {
    fn from(command: DeviceCommand) -> Self {
        Self(command.as_str().to_string())
    }
}

/// Commands understood by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceCommand {
    /// Enable light monitoring.
    #[serde(rename = "MONITOR_ON")]
    MonitorOn,
    /// Disable light monitoring.
    #[serde(rename = "MONITOR_OFF")]
    MonitorOff,
    /// Enable the alarm output.
    #[serde(rename = "ALARM_ON")]
    AlarmOn,
    /// Disable the alarm output.
    #[serde(rename = "ALARM_OFF")]
    AlarmOff,
    /// Ask the device to report its state in a `STATUS` line.
    #[serde(rename = "STATUS?")]
    StatusQuery,
}

impl DeviceCommand {
    /// Returns every known command.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MonitorOn,
            Self::MonitorOff,
            Self::AlarmOn,
            Self::AlarmOff,
            Self::StatusQuery,
        ]
    }

    /// Returns the wire token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MonitorOn => "MONITOR_ON",
            Self::MonitorOff => "MONITOR_OFF",
            Self::AlarmOn => "ALARM_ON",
            Self::AlarmOff => "ALARM_OFF",
            Self::StatusQuery => "STATUS?",
        }
    }

    /// Returns the command setting monitoring to `enabled`.
    #[must_use]
    pub const fn monitoring(enabled: bool) -> Self {
        if enabled { Self::MonitorOn } else { Self::MonitorOff }
    }

    /// Returns the command setting the alarm to `enabled`.
    #[must_use]
    pub const fn alarm(enabled: bool) -> Self {
        if enabled { Self::AlarmOn } else { Self::AlarmOff }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCommand {
    type Err = String;

    /// Parses an exact, case-sensitive wire token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| format!("unknown device command: {s}"))
    }
}
