// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concurrency-safe handle to a [`DeviceState`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::telemetry::Message;

use super::{DeviceState, LinkStatus};

/// Shared, cloneable handle to the device state.
///
/// One producer (the reader loop) mutates the state while any number of
/// consumers take snapshots. Every mutation runs under a single write lock,
/// so a snapshot sees either all of a line's updates or none of them.
///
/// Watchers created with [`subscribe`](Self::subscribe) are notified after
/// each mutation, in mutation order.
///
/// # Examples
///
/// ```
/// use ldrlink::telemetry::parse_line;
/// use ldrlink::state::SharedDeviceState;
///
/// let state = SharedDeviceState::new();
/// let line = "DATA;LDR=512;MON=0";
/// state.apply_line(line, parse_line(line).as_ref());
///
/// let snapshot = state.snapshot();
/// assert_eq!(snapshot.light_level().value(), 512);
/// assert!(!snapshot.monitoring_enabled());
/// assert_eq!(snapshot.last_raw_line(), line);
/// ```
#[derive(Debug, Clone)]
pub struct SharedDeviceState {
    inner: Arc<RwLock<DeviceState>>,
    notify: Arc<watch::Sender<DeviceState>>,
}

impl SharedDeviceState {
    /// Creates a handle holding the power-on defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(DeviceState::new())
    }

    /// Creates a handle holding `state`.
    #[must_use]
    pub fn with_state(state: DeviceState) -> Self {
        let (notify, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(RwLock::new(state)),
            notify: Arc::new(notify),
        }
    }

    /// Returns a point-in-time copy of the state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.inner.read().clone()
    }

    /// Creates a receiver that observes every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DeviceState> {
        self.notify.subscribe()
    }

    /// Records a raw line received now. Empty lines are ignored.
    pub fn apply_raw(&self, line: &str) -> bool {
        self.update(|state| state.record_raw(line, Utc::now()))
    }

    /// Applies every field update carried by `message`.
    pub fn apply_message(&self, message: &Message) -> bool {
        self.update(|state| state.apply_all(message.updates()))
    }

    /// Records a raw line and applies its parsed message in one step.
    ///
    /// Returns `true` if the state changed.
    pub fn apply_line(&self, line: &str, message: Option<&Message>) -> bool {
        self.apply_line_at(line, message, Utc::now())
    }

    /// Like [`apply_line`](Self::apply_line) with an explicit receive time.
    pub fn apply_line_at(&self, line: &str, message: Option<&Message>, at: DateTime<Utc>) -> bool {
        self.update(|state| {
            let raw_changed = state.record_raw(line, at);
            let fields_changed = message.is_some_and(|msg| state.apply_all(msg.updates()));
            raw_changed || fields_changed
        })
    }

    /// Sets the reader lifecycle status.
    pub fn set_link_status(&self, status: LinkStatus) -> bool {
        self.update(|state| state.set_link_status(status))
    }

    fn update(&self, mutate: impl FnOnce(&mut DeviceState) -> bool) -> bool {
        let mut state = self.inner.write();
        let changed = mutate(&mut state);
        if changed {
            // Published under the write lock so watchers see mutation order
            self.notify.send_replace(state.clone());
        }
        changed
    }
}

impl Default for SharedDeviceState {
    fn default() -> Self {
        Self::new()
    }
}
