// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Telemetry line parsing.
//!
//! The device reports its state as `;`-separated text lines:
//!
//! - `DATA;LDR=<int>;MON=<0|1>;ALARM=<0|1>` - periodic telemetry
//! - `STATUS;...` - reply to a `STATUS?` query, same layout
//!
//! Anything else the device prints (boot banners, debug output) is not a
//! message. It is still recorded as the last raw line by the reader loop.
//!
//! # Examples
//!
//! ```
//! use ldrlink::telemetry::{MessageKind, parse_line};
//!
//! let msg = parse_line("DATA;LDR=512;MON=1;ALARM=0").unwrap();
//! assert_eq!(msg.kind(), MessageKind::Telemetry);
//! assert_eq!(msg.light_level().map(|l| l.value()), Some(512));
//! assert_eq!(msg.monitoring(), Some(true));
//! assert_eq!(msg.alarm(), Some(false));
//!
//! assert!(parse_line("HELLO;LDR=5").is_none());
//! ```

mod line_parser;

pub use line_parser::parse_line;

use serde::{Deserialize, Serialize};

use crate::state::FieldUpdate;
use crate::types::LightLevel;

/// Which kind of line a [`Message`] was parsed from.
///
/// Both kinds carry the same fields; they differ only in why the device
/// sent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Periodic telemetry (`DATA`).
    #[serde(rename = "data")]
    Telemetry,
    /// Reply to a status query (`STATUS`).
    #[serde(rename = "status")]
    StatusReply,
}

impl MessageKind {
    /// Returns the leading tag of the line.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Telemetry => "DATA",
            Self::StatusReply => "STATUS",
        }
    }

    /// Looks up a kind by its exact, case-sensitive tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "DATA" => Some(Self::Telemetry),
            "STATUS" => Some(Self::StatusReply),
            _ => None,
        }
    }
}

/// One parsed device line: its kind and the field updates that validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    updates: Vec<FieldUpdate>,
}

impl Message {
    /// Creates a message with the given updates, in line order.
    #[must_use]
    pub fn new(kind: MessageKind, updates: Vec<FieldUpdate>) -> Self {
        Self { kind, updates }
    }

    /// Returns the message kind.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the validated updates in line order.
    #[must_use]
    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }

    /// Returns `true` if no field on the line validated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Returns the update for a wire key (`LDR`, `MON`, `ALARM`).
    ///
    /// If the key appeared more than once, the last valid occurrence wins,
    /// matching the order in which updates are applied.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<FieldUpdate> {
        self.updates.iter().rev().find(|u| u.key() == key).copied()
    }

    /// Returns the reported light level, if present and valid.
    #[must_use]
    pub fn light_level(&self) -> Option<LightLevel> {
        self.updates.iter().rev().find_map(|u| match u {
            FieldUpdate::LightLevel(level) => Some(*level),
            _ => None,
        })
    }

    /// Returns the reported monitoring flag, if present and valid.
    #[must_use]
    pub fn monitoring(&self) -> Option<bool> {
        self.updates.iter().rev().find_map(|u| match u {
            FieldUpdate::Monitoring(enabled) => Some(*enabled),
            _ => None,
        })
    }

    /// Returns the reported alarm flag, if present and valid.
    #[must_use]
    pub fn alarm(&self) -> Option<bool> {
        self.updates.iter().rev().find_map(|u| match u {
            FieldUpdate::Alarm(enabled) => Some(*enabled),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags() {
        assert_eq!(MessageKind::from_tag("DATA"), Some(MessageKind::Telemetry));
        assert_eq!(MessageKind::from_tag("STATUS"), Some(MessageKind::StatusReply));
        assert_eq!(MessageKind::from_tag("data"), None);
        assert_eq!(MessageKind::from_tag("DATA "), None);
        assert_eq!(MessageKind::StatusReply.tag(), "STATUS");
    }

    #[test]
    fn field_lookup_prefers_last_occurrence() {
        let msg = Message::new(
            MessageKind::Telemetry,
            vec![
                FieldUpdate::light_level(LightLevel::new(1)),
                FieldUpdate::alarm(true),
                FieldUpdate::light_level(LightLevel::new(2)),
            ],
        );

        assert_eq!(
            msg.field("LDR"),
            Some(FieldUpdate::light_level(LightLevel::new(2)))
        );
        assert_eq!(msg.light_level(), Some(LightLevel::new(2)));
        assert_eq!(msg.alarm(), Some(true));
        assert_eq!(msg.monitoring(), None);
        assert_eq!(msg.field("FOO"), None);
    }

    #[test]
    fn empty_message() {
        let msg = Message::new(MessageKind::StatusReply, Vec::new());
        assert!(msg.is_empty());
        assert!(msg.updates().is_empty());
    }
}
