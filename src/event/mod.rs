// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for live link activity.
//!
//! The reader loop and the command channel publish [`LinkEvent`]s on an
//! [`EventBus`], a tokio broadcast channel. Consumers that only care about
//! the latest state can use
//! [`SharedDeviceState::subscribe`](crate::state::SharedDeviceState::subscribe)
//! instead.
//!
//! # Examples
//!
//! ```
//! use ldrlink::event::{EventBus, LinkEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(LinkEvent::line_received("DATA;LDR=3", None));
//! assert!(rx.try_recv().unwrap().is_line());
//! ```

mod event_bus;
mod link_event;

pub use event_bus::EventBus;
pub use link_event::LinkEvent;
