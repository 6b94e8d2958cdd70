// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! [`DeviceState`] is the plain record of the latest known device values,
//! [`FieldUpdate`] is one validated change to it, and [`SharedDeviceState`]
//! is the synchronized handle shared between the reader loop and any number
//! of snapshot readers.
//!
//! # Examples
//!
//! ```
//! use ldrlink::state::{DeviceState, FieldUpdate};
//!
//! let mut state = DeviceState::new();
//!
//! // Apply returns true if state actually changed
//! assert!(state.apply(&FieldUpdate::monitoring(false)));
//! assert!(!state.apply(&FieldUpdate::monitoring(false)));
//! ```

mod device_state;
mod field_update;
mod shared;

pub use device_state::{DeviceState, LinkStatus};
pub use field_update::{FieldUpdate, KEY_ALARM, KEY_LIGHT_LEVEL, KEY_MONITORING};
pub use shared::SharedDeviceState;
