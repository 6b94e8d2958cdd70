// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types carried on the device link.
//!
//! # Types
//!
//! - [`LightLevel`] - Raw light sensor reading (`LDR` key)
//! - [`Switch`] - A `0`/`1` flag (`MON` and `ALARM` keys)

mod light_level;
mod switch;

pub use light_level::LightLevel;
pub use switch::Switch;
