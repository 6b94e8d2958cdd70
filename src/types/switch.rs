// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary flags reported by the device.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// A device-side on/off flag, encoded on the wire as `1` or `0`.
///
/// Only the two literals are accepted; `ON`, `true`, `2` and friends are
/// rejected so that a garbled line can never flip a flag.
///
/// # Examples
///
/// ```
/// use ldrlink::types::Switch;
///
/// assert_eq!("1".parse::<Switch>(), Ok(Switch::On));
/// assert!("ON".parse::<Switch>().is_err());
/// assert!(bool::from(Switch::On));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Switch {
    /// Flag cleared (`0`).
    Off,
    /// Flag set (`1`).
    On,
}

impl Switch {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::On => "1",
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Switch {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Self::Off),
            "1" => Ok(Self::On),
            _ => Err(ValueError::InvalidSwitch(s.to_string())),
        }
    }
}

impl From<bool> for Switch {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<Switch> for bool {
    fn from(value: Switch) -> Self {
        matches!(value, Switch::On)
    }
}
