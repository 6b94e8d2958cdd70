// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ldrlink` library.
//!
//! At runtime only two kinds of failure reach a caller: transport failures on the
//! device link ([`LinkError`]) and rejected commands ([`CommandError`]).
//! Malformed telemetry is absorbed by the parser and never surfaces as an
//! error.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred on the device link.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// A command was rejected.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A wire value failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The supplied configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Errors raised when a wire value does not validate.
///
/// The telemetry parser swallows these per field; they only surface when a
/// value type is parsed directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The text is not a signed integer.
    #[error("invalid light level: {0:?}")]
    InvalidLightLevel(String),

    /// The text is neither `0` nor `1`.
    #[error("invalid switch value: {0:?}")]
    InvalidSwitch(String),
}

/// Errors raised by the transport underneath the device link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Reading from or writing to the link failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening or configuring the serial port failed.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// A write did not complete in time.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// There is no link to talk to.
    #[error("device link unavailable: {0}")]
    Unavailable(String),

    /// The link was closed by the other side.
    #[error("device link closed")]
    Closed,
}

/// Errors returned when issuing a command.
///
/// Validation failures and transport failures are kept apart so a caller can
/// tell "you sent nothing useful" from "the device is unreachable".
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command text was empty after trimming. Nothing was written.
    #[error("command is empty")]
    Empty,

    /// The command could not be written to the device link.
    #[error("failed to send command: {0}")]
    Link(#[from] LinkError),
}

impl CommandError {
    /// Returns `true` if the command was rejected before touching the link.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_display() {
        assert_eq!(CommandError::Empty.to_string(), "command is empty");

        let err = CommandError::Link(LinkError::Closed);
        assert_eq!(err.to_string(), "failed to send command: device link closed");
    }

    #[test]
    fn validation_is_distinct_from_transport() {
        assert!(CommandError::Empty.is_validation());
        assert!(!CommandError::Link(LinkError::Timeout(2000)).is_validation());
    }

    #[test]
    fn error_from_link_error() {
        let err: Error = LinkError::Unavailable("no port".to_string()).into();
        assert!(matches!(err, Error::Link(LinkError::Unavailable(_))));
        assert_eq!(err.to_string(), "link error: device link unavailable: no port");
    }

    #[test]
    fn value_error_display() {
        let err = ValueError::InvalidSwitch("9".to_string());
        assert_eq!(err.to_string(), "invalid switch value: \"9\"");
    }

    #[test]
    fn link_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe gone");
        let err: LinkError = io.into();
        assert!(matches!(err, LinkError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: pipe gone");
    }
}
