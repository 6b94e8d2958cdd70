// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for `DATA`/`STATUS` device lines.

use crate::state::{FieldUpdate, KEY_ALARM, KEY_LIGHT_LEVEL, KEY_MONITORING};
use crate::types::{LightLevel, Switch};

use super::{Message, MessageKind};

const SEGMENT_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = '=';

/// Parses one framed line into a [`Message`].
///
/// Returns `None` unless the trimmed line starts with a `DATA` or `STATUS`
/// segment. For a qualifying line every `KEY=VALUE` segment is validated on
/// its own:
///
/// - `LDR` must be a signed integer
/// - `MON` and `ALARM` must be exactly `0` or `1`
///
/// Values are trimmed before validation. Segments without exactly one `=`,
/// unknown keys and invalid values are skipped without error, so a line
/// whose fields all fail still yields an empty message.
///
/// # Examples
///
/// ```
/// use ldrlink::telemetry::parse_line;
///
/// let msg = parse_line("DATA;LDR=abc;MON=9;FOO=1").unwrap();
/// assert!(msg.is_empty());
///
/// let msg = parse_line("STATUS;MON=0;junk;LDR= 42 ").unwrap();
/// assert_eq!(msg.updates().len(), 2);
/// ```
#[must_use]
pub fn parse_line(line: &str) -> Option<Message> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut segments = line.split(SEGMENT_SEPARATOR);
    let kind = segments.next().and_then(MessageKind::from_tag)?;
    let updates = segments.filter_map(parse_segment).collect();

    Some(Message::new(kind, updates))
}

fn parse_segment(segment: &str) -> Option<FieldUpdate> {
    let (key, value) = segment.split_once(KEY_VALUE_SEPARATOR)?;
    if value.contains(KEY_VALUE_SEPARATOR) {
        tracing::trace!(segment, "Skipping segment with more than one '='");
        return None;
    }
    let value = value.trim();

    let update = match key {
        KEY_LIGHT_LEVEL => value.parse::<LightLevel>().ok().map(FieldUpdate::LightLevel),
        KEY_MONITORING => parse_switch(value).map(FieldUpdate::Monitoring),
        KEY_ALARM => parse_switch(value).map(FieldUpdate::Alarm),
        _ => {
            tracing::trace!(key, "Skipping unrecognized key");
            return None;
        }
    };

    if update.is_none() {
        tracing::trace!(key, value, "Skipping invalid field value");
    }
    update
}

fn parse_switch(value: &str) -> Option<bool> {
    value.parse::<Switch>().ok().map(bool::from)
}
