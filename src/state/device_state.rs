// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state record.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::LightLevel;

use super::FieldUpdate;

/// Lifecycle of the reader feeding a [`DeviceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// The reader has not read anything yet.
    #[default]
    Starting,
    /// The reader is running.
    Running,
    /// The reader has stopped; the state will not change any more.
    Stopped,
}

/// Latest known state of the device.
///
/// Every value field holds the most recent *validated* update for that field.
/// `last_raw_line` holds the most recent non-empty line, whether or not it
/// parsed. `last_read_at` and `link_status` let a consumer tell live data
/// from data frozen by a dead link.
///
/// Serialized in camelCase, which is the shape served to web clients.
///
/// # Examples
///
/// ```
/// use ldrlink::state::DeviceState;
///
/// let state = DeviceState::new();
/// assert_eq!(state.light_level().value(), 0);
/// assert!(state.monitoring_enabled());
/// assert!(state.alarm_enabled());
/// assert_eq!(state.last_raw_line(), "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    light_level: LightLevel,
    monitoring_enabled: bool,
    alarm_enabled: bool,
    last_raw_line: String,
    last_read_at: Option<DateTime<Utc>>,
    link_status: LinkStatus,
}

impl DeviceState {
    /// Creates the power-on state: no light, monitoring and alarm enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            light_level: LightLevel::default(),
            monitoring_enabled: true,
            alarm_enabled: true,
            last_raw_line: String::new(),
            last_read_at: None,
            link_status: LinkStatus::Starting,
        }
    }

    /// Gets the light sensor reading.
    #[must_use]
    pub fn light_level(&self) -> LightLevel {
        self.light_level
    }

    /// Returns `true` if the device reports monitoring as enabled.
    #[must_use]
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring_enabled
    }

    /// Returns `true` if the device reports the alarm as enabled.
    #[must_use]
    pub fn alarm_enabled(&self) -> bool {
        self.alarm_enabled
    }

    /// Gets the most recent non-empty line received, valid or not.
    #[must_use]
    pub fn last_raw_line(&self) -> &str {
        &self.last_raw_line
    }

    /// Gets the instant of the last non-empty line read from the link.
    #[must_use]
    pub fn last_read_at(&self) -> Option<DateTime<Utc>> {
        self.last_read_at
    }

    /// Gets the reader lifecycle status.
    #[must_use]
    pub fn link_status(&self) -> LinkStatus {
        self.link_status
    }

    /// Returns `true` if nothing has been read within `max_age` of `now`.
    ///
    /// A state that never received a line is always stale.
    #[must_use]
    pub fn is_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let Some(at) = self.last_read_at else {
            return true;
        };
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => now.signed_duration_since(at) > max_age,
            Err(_) => false,
        }
    }

    /// Records a raw line as received at `at`.
    ///
    /// Empty lines are ignored. Returns `true` if the state was modified.
    pub fn record_raw(&mut self, line: &str, at: DateTime<Utc>) -> bool {
        if line.is_empty() {
            return false;
        }
        if self.last_raw_line != line {
            line.clone_into(&mut self.last_raw_line);
        }
        self.last_read_at = Some(at);
        true
    }

    /// Sets the reader lifecycle status.
    ///
    /// Returns `true` if the status changed.
    pub fn set_link_status(&mut self, status: LinkStatus) -> bool {
        if self.link_status == status {
            false
        } else {
            self.link_status = status;
            true
        }
    }

    /// Applies a field update and returns whether the state actually changed.
    pub fn apply(&mut self, update: &FieldUpdate) -> bool {
        match *update {
            FieldUpdate::LightLevel(level) => replace_if_changed(&mut self.light_level, level),
            FieldUpdate::Monitoring(enabled) => {
                replace_if_changed(&mut self.monitoring_enabled, enabled)
            }
            FieldUpdate::Alarm(enabled) => replace_if_changed(&mut self.alarm_enabled, enabled),
        }
    }

    /// Applies updates in order, later updates winning.
    ///
    /// Returns `true` if any of them changed the state.
    pub fn apply_all<'a>(&mut self, updates: impl IntoIterator<Item = &'a FieldUpdate>) -> bool {
        let mut any_changed = false;
        for update in updates {
            if self.apply(update) {
                any_changed = true;
            }
        }
        any_changed
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_has_power_on_defaults() {
        let state = DeviceState::new();
        assert_eq!(state.light_level(), LightLevel::new(0));
        assert!(state.monitoring_enabled());
        assert!(state.alarm_enabled());
        assert_eq!(state.last_raw_line(), "");
        assert!(state.last_read_at().is_none());
        assert_eq!(state.link_status(), LinkStatus::Starting);
        assert_eq!(state, DeviceState::default());
    }

    #[test]
    fn apply_light_level() {
        let mut state = DeviceState::new();
        let update = FieldUpdate::light_level(LightLevel::new(512));

        assert!(state.apply(&update));
        assert_eq!(state.light_level().value(), 512);

        // Applying same value returns false
        assert!(!state.apply(&update));
    }

    #[test]
    fn apply_flags_independently() {
        let mut state = DeviceState::new();

        assert!(state.apply(&FieldUpdate::monitoring(false)));
        assert!(!state.monitoring_enabled());
        assert!(state.alarm_enabled());

        assert!(state.apply(&FieldUpdate::alarm(false)));
        assert!(!state.alarm_enabled());
    }

    #[test]
    fn apply_all_last_update_wins() {
        let mut state = DeviceState::new();
        let updates = [
            FieldUpdate::light_level(LightLevel::new(1)),
            FieldUpdate::light_level(LightLevel::new(2)),
            FieldUpdate::monitoring(true),
        ];

        assert!(state.apply_all(&updates));
        assert_eq!(state.light_level().value(), 2);
        assert!(!state.apply_all(&updates[1..]));
    }

    #[test]
    fn record_raw_ignores_empty_lines() {
        let mut state = DeviceState::new();
        let at = Utc::now();

        assert!(!state.record_raw("", at));
        assert!(state.last_read_at().is_none());

        assert!(state.record_raw("garbage", at));
        assert_eq!(state.last_raw_line(), "garbage");
        assert_eq!(state.last_read_at(), Some(at));
    }

    #[test]
    fn record_raw_does_not_touch_values() {
        let mut state = DeviceState::new();
        state.record_raw("DATA;LDR=999", Utc::now());
        assert_eq!(state.light_level().value(), 0);
    }

    #[test]
    fn staleness() {
        let mut state = DeviceState::new();
        let now = Utc::now();
        let max_age = Duration::from_secs(5);

        assert!(state.is_stale(max_age, now));

        state.record_raw("DATA", now - chrono::Duration::seconds(2));
        assert!(!state.is_stale(max_age, now));
        assert!(state.is_stale(max_age, now + chrono::Duration::seconds(10)));
    }

    #[test]
    fn link_status_transitions() {
        let mut state = DeviceState::new();
        assert!(state.set_link_status(LinkStatus::Running));
        assert!(!state.set_link_status(LinkStatus::Running));
        assert!(state.set_link_status(LinkStatus::Stopped));
        assert_eq!(state.link_status(), LinkStatus::Stopped);
    }

    #[test]
    fn serializes_in_camel_case() {
        let mut state = DeviceState::new();
        state.apply(&FieldUpdate::light_level(LightLevel::new(300)));
        state.apply(&FieldUpdate::alarm(false));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["lightLevel"], 300);
        assert_eq!(json["monitoringEnabled"], true);
        assert_eq!(json["alarmEnabled"], false);
        assert_eq!(json["lastRawLine"], "");
        assert_eq!(json["lastReadAt"], serde_json::Value::Null);
        assert_eq!(json["linkStatus"], "starting");
    }
}
