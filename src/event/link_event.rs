// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Link event types.

use serde::Serialize;

use crate::reader::StopReason;
use crate::state::DeviceState;
use crate::telemetry::MessageKind;

/// Events emitted by the reader loop and the command channel.
///
/// Serialized with a `type` tag so a host can forward them verbatim to live
/// clients.
///
/// # Examples
///
/// ```
/// use ldrlink::event::LinkEvent;
/// use ldrlink::telemetry::MessageKind;
///
/// let event = LinkEvent::line_received("DATA;LDR=12", Some(MessageKind::Telemetry));
/// assert!(event.is_line());
/// assert_eq!(event.line(), Some("DATA;LDR=12"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LinkEvent {
    /// A non-empty line was read from the device.
    LineReceived {
        /// The line, trimmed.
        line: String,
        /// Kind of message the line parsed as, if any.
        kind: Option<MessageKind>,
    },

    /// The device state changed.
    StateChanged {
        /// The complete new state.
        state: DeviceState,
    },

    /// A command was written to the device.
    CommandSent {
        /// The command token, without terminator.
        command: String,
    },

    /// The reader loop ended; the state is frozen from now on.
    ReaderStopped {
        /// Why the loop ended.
        reason: StopReason,
    },
}

impl LinkEvent {
    /// Creates a line received event.
    #[must_use]
    pub fn line_received(line: impl Into<String>, kind: Option<MessageKind>) -> Self {
        Self::LineReceived {
            line: line.into(),
            kind,
        }
    }

    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(state: DeviceState) -> Self {
        Self::StateChanged { state }
    }

    /// Creates a command sent event.
    #[must_use]
    pub fn command_sent(command: impl Into<String>) -> Self {
        Self::CommandSent {
            command: command.into(),
        }
    }

    /// Creates a reader stopped event.
    #[must_use]
    pub fn reader_stopped(reason: StopReason) -> Self {
        Self::ReaderStopped { reason }
    }

    /// Returns `true` if this is a received line.
    #[must_use]
    pub fn is_line(&self) -> bool {
        matches!(self, Self::LineReceived { .. })
    }

    /// Returns `true` if this is a state change.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Returns the received line, if this is a line event.
    #[must_use]
    pub fn line(&self) -> Option<&str> {
        match self {
            Self::LineReceived { line, .. } => Some(line),
            _ => None,
        }
    }

    /// Returns the new state, if this is a state change.
    #[must_use]
    pub fn state(&self) -> Option<&DeviceState> {
        match self {
            Self::StateChanged { state } => Some(state),
            _ => None,
        }
    }
}
