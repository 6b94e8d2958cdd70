// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The boundary between the device link and its consumers.
//!
//! A [`Bridge`] owns one device link: a background reader loop keeps the
//! shared state current and a command channel serializes writes. Consumers
//! see two operations, [`snapshot`](Bridge::snapshot) and
//! [`issue_command`](Bridge::issue_command), plus an optional event stream.
//!
//! # Examples
//!
//! ```
//! use ldrlink::{Bridge, BridgeConfig};
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (device, mut host) = tokio::io::duplex(256);
//! let bridge = Bridge::from_stream(device, &BridgeConfig::default());
//!
//! let reply = bridge.issue_command("STATUS?").await;
//! assert!(reply.ok);
//!
//! let mut buf = [0u8; 8];
//! host.read_exact(&mut buf).await.unwrap();
//! assert_eq!(&buf, b"STATUS?\n");
//!
//! bridge.shutdown().await;
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::command::{Command, CommandChannel};
use crate::config::BridgeConfig;
use crate::error::CommandError;
use crate::event::{EventBus, LinkEvent};
use crate::link::{LinkReader, LinkWriter, StreamWriter, split};
use crate::reader::{ReaderLoop, StopReason};
use crate::state::{DeviceState, SharedDeviceState};

#[cfg(feature = "serial")]
use crate::error::LinkError;
#[cfg(feature = "serial")]
use crate::link::serial::{self, SerialWriter};

/// Outcome of [`Bridge::issue_command`], shaped for a JSON reply.
///
/// Serializes as `{"ok":true,"cmd":"STATUS?"}` on success and
/// `{"ok":false,"error":"command is empty"}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    /// Whether the command was written to the device.
    pub ok: bool,
    /// The command as written, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Why the command was not written, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    rejected: bool,
}

impl CommandReply {
    /// Creates a success reply.
    #[must_use]
    pub fn sent(command: &Command) -> Self {
        Self {
            ok: true,
            cmd: Some(command.as_str().to_string()),
            error: None,
            rejected: false,
        }
    }

    /// Creates a failure reply.
    #[must_use]
    pub fn failed(error: &CommandError) -> Self {
        Self {
            ok: false,
            cmd: None,
            error: Some(error.to_string()),
            rejected: error.is_validation(),
        }
    }

    /// Returns `true` if the command was refused before reaching the link.
    ///
    /// A host serving this over HTTP maps it to a client error and any
    /// other failure to a server error.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }
}

impl From<Result<Command, CommandError>> for CommandReply {
    fn from(result: Result<Command, CommandError>) -> Self {
        match result {
            Ok(command) => Self::sent(&command),
            Err(error) => Self::failed(&error),
        }
    }
}

/// A running device link.
///
/// Dropping a bridge cancels its reader loop. Use
/// [`shutdown`](Self::shutdown) to also wait for the loop to finish.
#[derive(Debug)]
pub struct Bridge<W> {
    state: SharedDeviceState,
    events: EventBus,
    commands: CommandChannel<W>,
    reader: JoinHandle<StopReason>,
    cancel: DropGuard,
}

impl<W: LinkWriter> Bridge<W> {
    /// Starts a bridge over an already opened link.
    ///
    /// Spawns the reader loop on the current tokio runtime.
    #[must_use]
    pub fn start<R: LinkReader>(reader: R, writer: W, config: &BridgeConfig) -> Self {
        let state = SharedDeviceState::new();
        let events = EventBus::with_capacity(config.event_capacity);
        let cancel = CancellationToken::new();

        let reader = ReaderLoop::new(reader, state.clone(), events.clone(), config.reader.clone())
            .with_read_timeout(config.link.read_timeout)
            .spawn(cancel.clone());

        let commands = CommandChannel::new(writer)
            .with_write_timeout(config.link.write_timeout)
            .with_events(events.clone());

        tracing::info!(port = %config.link.port, "Bridge started");

        Self {
            state,
            events,
            commands,
            reader,
            cancel: cancel.drop_guard(),
        }
    }

    /// Returns a consistent copy of the latest device state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.state.snapshot()
    }

    /// Sends a command to the device and reports the outcome.
    ///
    /// Never fails: validation and transport errors are carried in the
    /// reply.
    pub async fn issue_command(&self, text: &str) -> CommandReply {
        let result = self.commands.send(text).await;
        if let Err(e) = &result {
            tracing::debug!(command = text, error = %e, "Command not sent");
        }
        result.into()
    }

    /// Subscribes to live link events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }

    /// Watches state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<DeviceState> {
        self.state.subscribe()
    }

    /// Returns the shared state handle.
    #[must_use]
    pub fn state(&self) -> &SharedDeviceState {
        &self.state
    }

    /// Returns the command channel, for callers that want typed errors.
    #[must_use]
    pub fn commands(&self) -> &CommandChannel<W> {
        &self.commands
    }

    /// Returns `true` once the reader loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished()
    }

    /// Stops the reader loop, detaches the link, and waits for the loop.
    ///
    /// Returns why the loop ended. If it had already stopped on its own
    /// (link closed) that reason is returned instead of `Cancelled`.
    pub async fn shutdown(self) -> StopReason {
        let Self {
            commands,
            reader,
            cancel,
            ..
        } = self;

        cancel.disarm().cancel();
        drop(commands.detach().await);

        match reader.await {
            Ok(reason) => {
                tracing::info!(%reason, "Bridge shut down");
                reason
            }
            Err(e) => {
                tracing::error!(error = %e, "Reader task failed");
                StopReason::Cancelled
            }
        }
    }
}

impl<S> Bridge<StreamWriter<WriteHalf<S>>>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Starts a bridge over any duplex byte stream.
    #[must_use]
    pub fn from_stream(stream: S, config: &BridgeConfig) -> Self {
        let (reader, writer) = split(stream);
        Self::start(reader, writer, config)
    }
}

#[cfg(feature = "serial")]
impl Bridge<SerialWriter> {
    /// Opens the configured serial port and starts a bridge over it.
    ///
    /// # Errors
    ///
    /// Returns `LinkError` if the port cannot be opened.
    pub fn open_serial(config: &BridgeConfig) -> Result<Self, LinkError> {
        let (reader, writer) = serial::open(&config.link)?;
        Ok(Self::start(reader, writer, config))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::error::LinkError;
    use crate::state::LinkStatus;

    #[test]
    fn reply_json_shapes() {
        let ok = CommandReply::sent(&Command::new("ALARM_ON").unwrap());
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"ok":true,"cmd":"ALARM_ON"}"#
        );

        let empty = CommandReply::failed(&CommandError::Empty);
        assert_eq!(
            serde_json::to_string(&empty).unwrap(),
            r#"{"ok":false,"error":"command is empty"}"#
        );
        assert!(empty.is_rejected());

        let unavailable = CommandReply::failed(&CommandError::Link(LinkError::Closed));
        assert!(!unavailable.ok);
        assert!(!unavailable.is_rejected());
    }

    #[tokio::test]
    async fn telemetry_reaches_snapshot() {
        let (device, mut host) = tokio::io::duplex(256);
        let bridge = Bridge::from_stream(device, &BridgeConfig::default());
        let mut watch = bridge.watch_state();

        host.write_all(b"DATA;LDR=812;MON=1;ALARM=0\r\n").await.unwrap();
        watch
            .wait_for(|s| s.light_level().value() == 812)
            .await
            .unwrap();

        let snap = bridge.snapshot();
        assert!(!snap.alarm_enabled());
        assert_eq!(snap.link_status(), LinkStatus::Running);

        assert_eq!(bridge.shutdown().await, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn issue_command_writes_line() {
        let (device, mut host) = tokio::io::duplex(256);
        let bridge = Bridge::from_stream(device, &BridgeConfig::default());

        let reply = bridge.issue_command(" MONITOR_OFF ").await;
        assert_eq!(reply.cmd.as_deref(), Some("MONITOR_OFF"));

        let mut buf = [0u8; 12];
        host.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"MONITOR_OFF\n");

        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn blank_command_is_rejected() {
        let (device, _host) = tokio::io::duplex(256);
        let bridge = Bridge::from_stream(device, &BridgeConfig::default());

        let reply = bridge.issue_command("   ").await;
        assert!(!reply.ok);
        assert!(reply.is_rejected());
        assert_eq!(reply.error.as_deref(), Some("command is empty"));

        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn closed_link_stops_reader() {
        let (device, host) = tokio::io::duplex(256);
        let bridge = Bridge::from_stream(device, &BridgeConfig::default());
        let mut watch = bridge.watch_state();

        drop(host);
        watch
            .wait_for(|s| s.link_status() == LinkStatus::Stopped)
            .await
            .unwrap();

        assert_eq!(bridge.shutdown().await, StopReason::LinkClosed);
    }

    #[tokio::test]
    async fn commands_fail_after_shutdown_of_clone() {
        let (device, _host) = tokio::io::duplex(256);
        let bridge = Bridge::from_stream(device, &BridgeConfig::default());
        let commands = bridge.commands().clone();

        assert_eq!(bridge.shutdown().await, StopReason::Cancelled);

        let err = commands.send("STATUS?").await.unwrap_err();
        assert!(matches!(err, CommandError::Link(LinkError::Unavailable(_))));
    }

    #[tokio::test]
    async fn dropping_bridge_cancels_reader() {
        let (device, _host) = tokio::io::duplex(256);
        let bridge = Bridge::from_stream(device, &BridgeConfig::default());
        let mut watch = bridge.watch_state();

        drop(bridge);

        tokio::time::timeout(
            Duration::from_secs(5),
            watch.wait_for(|s| s.link_status() == LinkStatus::Stopped),
        )
        .await
        .unwrap()
        .unwrap();
    }
}
