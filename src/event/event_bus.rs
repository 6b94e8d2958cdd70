// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting link events.

use tokio::sync::broadcast;

use crate::config::DEFAULT_EVENT_CAPACITY;

use super::LinkEvent;

/// Broadcasts link events to any number of subscribers.
///
/// Each subscriber gets its own copy of each event. The channel has a fixed
/// capacity; a subscriber that falls behind loses the oldest events and sees
/// `RecvError::Lagged`. Publishing never blocks the reader loop.
///
/// # Examples
///
/// ```
/// use ldrlink::event::{EventBus, LinkEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(LinkEvent::command_sent("STATUS?"));
/// assert_eq!(rx.try_recv().unwrap(), LinkEvent::command_sent("STATUS?"));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LinkEvent>,
}

impl EventBus {
    /// Creates an event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Creates an event bus buffering up to `capacity` events per
    /// subscriber. Zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is discarded.
    pub fn publish(&self, event: LinkEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
