// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialized writes to the device link.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::LinkConfig;
use crate::error::{CommandError, LinkError};
use crate::event::{EventBus, LinkEvent};
use crate::link::LinkWriter;

use super::{Command, DeviceCommand};

/// Sends commands to the device, one at a time.
///
/// The write half of the link sits behind an async mutex. Each command is
/// written with a single `send` while the lock is held, so commands from
/// concurrent callers never interleave on the wire. Clones share the same
/// link.
///
/// A write that fails or times out may leave part of a command on the wire.
/// The next write then starts with `\n` so the fragment ends up on a line of
/// its own instead of being glued to the next command.
///
/// # Examples
///
/// ```
/// use ldrlink::command::{CommandChannel, DeviceCommand};
/// use ldrlink::link::split;
/// use tokio::io::AsyncReadExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (device, mut host) = tokio::io::duplex(64);
/// let (_reader, writer) = split(device);
/// let channel = CommandChannel::new(writer);
///
/// channel.send_command(DeviceCommand::AlarmOff).await.unwrap();
///
/// let mut buf = [0u8; 10];
/// host.read_exact(&mut buf).await.unwrap();
/// assert_eq!(&buf, b"ALARM_OFF\n");
/// # }
/// ```
#[derive(Debug)]
pub struct CommandChannel<W> {
    slot: Arc<Mutex<WriterSlot<W>>>,
    write_timeout: Duration,
    events: Option<EventBus>,
}

impl<W> Clone for CommandChannel<W> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            write_timeout: self.write_timeout,
            events: self.events.clone(),
        }
    }
}

#[derive(Debug)]
struct WriterSlot<W> {
    writer: Option<W>,
    /// Set when the last write may have stopped mid-line.
    torn: bool,
}

impl<W: LinkWriter> CommandChannel<W> {
    /// Creates a channel writing to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self::with_slot(Some(writer))
    }

    /// Creates a channel with no link. Every send fails with
    /// `LinkError::Unavailable`.
    #[must_use]
    pub fn detached() -> Self {
        Self::with_slot(None)
    }

    fn with_slot(writer: Option<W>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(WriterSlot {
                writer,
                torn: false,
            })),
            write_timeout: LinkConfig::default().write_timeout,
            events: None,
        }
    }

    /// Sets the upper bound on writing one command.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Publishes a [`LinkEvent::CommandSent`] on `events` after each
    /// successful send.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns `true` if a link is attached.
    pub async fn is_attached(&self) -> bool {
        self.slot.lock().await.writer.is_some()
    }

    /// Removes the link from the channel and returns it.
    ///
    /// Waits for an in-flight send to finish. Later sends fail with
    /// `LinkError::Unavailable`.
    pub async fn detach(&self) -> Option<W> {
        let writer = self.slot.lock().await.writer.take();
        if writer.is_some() {
            tracing::debug!("Command channel detached");
        }
        writer
    }

    /// Validates `text` and writes it to the device followed by `\n`.
    ///
    /// Returns the command as written (trimmed).
    ///
    /// # Errors
    ///
    /// - `CommandError::Empty` if `text` is blank. Nothing is written.
    /// - `CommandError::Link` if no link is attached, the write fails, or
    ///   it does not finish within the write timeout.
    pub async fn send(&self, text: &str) -> Result<Command, CommandError> {
        let command = Command::new(text)?;
        self.write(&command).await?;

        tracing::info!(command = %command, "Command sent");
        if let Some(events) = &self.events {
            events.publish(LinkEvent::command_sent(command.as_str()));
        }
        Ok(command)
    }

    /// Sends one of the known device commands.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Link` if the write fails.
    pub async fn send_command(&self, command: DeviceCommand) -> Result<Command, CommandError> {
        self.send(command.as_str()).await
    }

    async fn write(&self, command: &Command) -> Result<(), LinkError> {
        let mut slot = self.slot.lock().await;
        let WriterSlot { writer, torn } = &mut *slot;
        let writer = writer
            .as_mut()
            .ok_or_else(|| LinkError::Unavailable("no device link attached".to_string()))?;

        let mut wire = Vec::new();
        if *torn {
            tracing::debug!("Terminating fragment left by an interrupted write");
            wire.push(b'\n');
        }
        wire.extend_from_slice(&command.to_wire());

        tracing::debug!(payload = ?String::from_utf8_lossy(&wire), "Writing command");

        let result = match tokio::time::timeout(self.write_timeout, writer.send(&wire)).await {
            Ok(result) => result.inspect_err(|e| {
                tracing::warn!(command = %command, error = %e, "Command write failed");
            }),
            Err(_) => {
                let ms = u64::try_from(self.write_timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(command = %command, timeout_ms = ms, "Command write timed out");
                Err(LinkError::Timeout(ms))
            }
        };
        *torn = result.is_err();
        result
    }
}
