// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validated updates to a single device field.
//!
//! A [`FieldUpdate`] is what survives parsing of one `KEY=VALUE` segment: the
//! key is recognized and the value passed validation. Updates are applied to
//! a [`DeviceState`](super::DeviceState) independently of each other, so one
//! bad segment never holds back the good ones on the same line.
//!
//! # Examples
//!
//! ```
//! use ldrlink::state::{DeviceState, FieldUpdate};
//! use ldrlink::types::LightLevel;
//!
//! let mut state = DeviceState::new();
//! state.apply(&FieldUpdate::light_level(LightLevel::new(640)));
//! state.apply(&FieldUpdate::alarm(false));
//!
//! assert_eq!(state.light_level(), LightLevel::new(640));
//! assert!(!state.alarm_enabled());
//! ```

use std::fmt;

use crate::types::{LightLevel, Switch};

/// Wire key of the light level field.
pub const KEY_LIGHT_LEVEL: &str = "LDR";
/// Wire key of the monitoring flag.
pub const KEY_MONITORING: &str = "MON";
/// Wire key of the alarm flag.
pub const KEY_ALARM: &str = "ALARM";

/// A validated new value for one device field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldUpdate {
    /// New light sensor reading (`LDR`).
    LightLevel(LightLevel),
    /// Monitoring switched on or off (`MON`).
    Monitoring(bool),
    /// Alarm switched on or off (`ALARM`).
    Alarm(bool),
}

impl FieldUpdate {
    /// Creates a light level update.
    #[must_use]
    pub fn light_level(level: LightLevel) -> Self {
        Self::LightLevel(level)
    }

    /// Creates a monitoring flag update.
    #[must_use]
    pub fn monitoring(enabled: bool) -> Self {
        Self::Monitoring(enabled)
    }

    /// Creates an alarm flag update.
    #[must_use]
    pub fn alarm(enabled: bool) -> Self {
        Self::Alarm(enabled)
    }

    /// Returns the wire key this update was read from.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::LightLevel(_) => KEY_LIGHT_LEVEL,
            Self::Monitoring(_) => KEY_MONITORING,
            Self::Alarm(_) => KEY_ALARM,
        }
    }

    /// Returns the value in its wire form.
    #[must_use]
    pub fn wire_value(&self) -> String {
        match self {
            Self::LightLevel(level) => level.to_string(),
            Self::Monitoring(flag) | Self::Alarm(flag) => Switch::from(*flag).to_string(),
        }
    }
}

impl fmt::Display for FieldUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.wire_value())
    }
}
