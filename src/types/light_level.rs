// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light sensor reading.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Raw light sensor reading as reported by the device.
///
/// The firmware samples a 10-bit ADC, so readings are conventionally in
/// `0..=1023`, but the value is not range-checked: any signed integer the
/// device reports is accepted.
///
/// # Examples
///
/// ```
/// use ldrlink::types::LightLevel;
///
/// let level: LightLevel = " 512 ".parse().unwrap();
/// assert_eq!(level.value(), 512);
/// assert!("abc".parse::<LightLevel>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LightLevel(i64);

impl LightLevel {
    /// Full-scale reading of the device's 10-bit ADC.
    pub const ADC_MAX: i64 = 1023;

    /// Wraps a raw reading.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw reading.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Returns the reading as a percentage of [`Self::ADC_MAX`], clamped to 0-100.
    ///
    /// ```
    /// use ldrlink::types::LightLevel;
    ///
    /// assert_eq!(LightLevel::new(1023).percent(), 100);
    /// assert_eq!(LightLevel::new(-4).percent(), 0);
    /// ```
    #[must_use]
    // Safe: clamped * 100 / 1023 is within 0..=100
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        let clamped = self.0.clamp(0, Self::ADC_MAX);
        (clamped * 100 / Self::ADC_MAX) as u8
    }
}

impl fmt::Display for LightLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LightLevel {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ValueError::InvalidLightLevel(s.to_string()))
    }
}

impl From<i64> for LightLevel {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<LightLevel> for i64 {
    fn from(level: LightLevel) -> Self {
        level.0
    }
}
