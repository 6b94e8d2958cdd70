// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background reader loop.
//!
//! One task owns the read half of the device link. It reads bounded chunks,
//! frames them into lines, parses each line and applies it to the shared
//! state. Nothing short of link closure or cancellation stops it: read
//! failures are logged and retried after a backoff.
//!
//! # Examples
//!
//! ```
//! use ldrlink::config::ReaderConfig;
//! use ldrlink::event::EventBus;
//! use ldrlink::link::split;
//! use ldrlink::reader::{ReaderLoop, StopReason};
//! use ldrlink::state::SharedDeviceState;
//! use tokio::io::AsyncWriteExt;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (device, mut host) = tokio::io::duplex(256);
//! let (reader, _writer) = split(device);
//! let state = SharedDeviceState::new();
//!
//! let task = ReaderLoop::new(reader, state.clone(), EventBus::new(), ReaderConfig::default())
//!     .spawn(CancellationToken::new());
//!
//! host.write_all(b"DATA;LDR=700;MON=1;ALARM=0\r\n").await.unwrap();
//! drop(host);
//!
//! assert_eq!(task.await.unwrap(), StopReason::LinkClosed);
//! assert_eq!(state.snapshot().light_level().value(), 700);
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{LinkConfig, ReaderConfig};
use crate::event::{EventBus, LinkEvent};
use crate::framing::LineFramer;
use crate::link::{LinkReader, ReadOutcome};
use crate::state::{LinkStatus, SharedDeviceState};
use crate::telemetry::{Message, parse_line};

/// Why a reader loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// The cancellation token fired.
    Cancelled,
    /// The link reported end of stream.
    LinkClosed,
    /// The configured limit of consecutive failed reads was reached.
    TooManyErrors,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cancelled => "cancelled",
            Self::LinkClosed => "link closed",
            Self::TooManyErrors => "too many consecutive read errors",
        };
        f.write_str(s)
    }
}

/// Reads the device link and keeps a [`SharedDeviceState`] current.
#[derive(Debug)]
pub struct ReaderLoop<R> {
    reader: R,
    state: SharedDeviceState,
    events: EventBus,
    config: ReaderConfig,
    read_timeout: Duration,
    framer: LineFramer,
}

impl<R: LinkReader> ReaderLoop<R> {
    /// Creates a reader loop over `reader`.
    ///
    /// Reads wait at most the default link read timeout; see
    /// [`with_read_timeout`](Self::with_read_timeout).
    #[must_use]
    pub fn new(
        reader: R,
        state: SharedDeviceState,
        events: EventBus,
        config: ReaderConfig,
    ) -> Self {
        let framer = LineFramer::with_max_line_length(config.max_line_length);
        Self {
            reader,
            state,
            events,
            config,
            read_timeout: LinkConfig::default().read_timeout,
            framer,
        }
    }

    /// Sets the upper bound on a single read.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Spawns the loop on the current tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<StopReason> {
        tokio::spawn(self.run(cancel))
    }

    /// Runs the loop until the link closes or `cancel` fires.
    ///
    /// On return the state's link status is [`LinkStatus::Stopped`] and a
    /// [`LinkEvent::ReaderStopped`] has been published.
    pub async fn run(mut self, cancel: CancellationToken) -> StopReason {
        tracing::info!(timeout = ?self.read_timeout, "Reader loop started");

        let reason = self.read_until_stopped(&cancel).await;

        if self.framer.pending() > 0 {
            tracing::debug!(bytes = self.framer.pending(), "Discarding unterminated line");
        }
        self.framer.reset();

        if self.state.set_link_status(LinkStatus::Stopped) {
            self.events
                .publish(LinkEvent::state_changed(self.state.snapshot()));
        }
        self.events.publish(LinkEvent::reader_stopped(reason));

        match reason {
            StopReason::TooManyErrors => tracing::error!(%reason, "Reader loop stopped"),
            StopReason::Cancelled | StopReason::LinkClosed => {
                tracing::info!(%reason, "Reader loop stopped");
            }
        }
        reason
    }

    async fn read_until_stopped(&mut self, cancel: &CancellationToken) -> StopReason {
        let mut buf = vec![0u8; self.config.read_buffer_size.max(1)];
        let mut consecutive_errors: u32 = 0;

        loop {
            let outcome = tokio::select! {
                biased;

                () = cancel.cancelled() => return StopReason::Cancelled,
                outcome = self.reader.read_chunk(&mut buf, self.read_timeout) => outcome,
            };

            match outcome {
                Ok(ReadOutcome::Data(n)) if n > 0 => {
                    consecutive_errors = 0;
                    self.handle_chunk(&buf[..n.min(buf.len())]);
                }
                Ok(ReadOutcome::Data(_) | ReadOutcome::Idle) => {
                    consecutive_errors = 0;
                    if !pause(cancel, self.config.idle_pause).await {
                        return StopReason::Cancelled;
                    }
                }
                Ok(ReadOutcome::Closed) => {
                    tracing::info!("Device link closed");
                    return StopReason::LinkClosed;
                }
                Err(e) => {
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    tracing::warn!(error = %e, consecutive_errors, "Read from device link failed");

                    if self
                        .config
                        .max_consecutive_errors
                        .is_some_and(|limit| consecutive_errors >= limit)
                    {
                        return StopReason::TooManyErrors;
                    }
                    if !pause(cancel, self.config.error_backoff).await {
                        return StopReason::Cancelled;
                    }
                }
            }
        }
    }

    fn handle_chunk(&mut self, chunk: &[u8]) {
        let Self {
            framer,
            state,
            events,
            ..
        } = self;

        if state.set_link_status(LinkStatus::Running) {
            events.publish(LinkEvent::state_changed(state.snapshot()));
        }

        for line in framer.feed(chunk) {
            handle_line(state, events, &line);
        }
    }
}

fn handle_line(state: &SharedDeviceState, events: &EventBus, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let message = parse_line(line);
    let kind = message.as_ref().map(Message::kind);
    tracing::debug!(line, ?kind, "Received line");

    events.publish(LinkEvent::line_received(line, kind));
    if state.apply_line(line, message.as_ref()) {
        events.publish(LinkEvent::state_changed(state.snapshot()));
    }
}

/// Sleeps for `duration`. Returns `false` if cancelled first.
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;

        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
