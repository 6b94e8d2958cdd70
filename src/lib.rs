// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ldrlink` - a bridge to a light-sensor alarm device on a serial link.
//!
//! The device streams `;`-separated telemetry lines and accepts single-token
//! commands. This library keeps a consistent, thread-safe snapshot of the
//! device state up to date from a background reader, and serializes commands
//! sent from any number of tasks.
//!
//! # Supported Features
//!
//! - **Telemetry**: `DATA` and `STATUS` lines with light level (`LDR`),
//!   monitoring (`MON`), and alarm (`ALARM`) fields
//! - **Robust framing**: lines split across reads, invalid UTF-8, and
//!   runaway lines without terminator are all handled
//! - **Commands**: `MONITOR_ON`, `MONITOR_OFF`, `ALARM_ON`, `ALARM_OFF`,
//!   `STATUS?`, or any other token
//! - **Live updates**: state watch channel and a broadcast event stream
//! - **Transports**: serial ports (`serial` feature, on by default) or any
//!   tokio byte stream
//!
//! # Quick Start
//!
//! ## Serial Device
//!
//! ```no_run
//! use ldrlink::{Bridge, BridgeConfig, LinkConfig};
//!
//! #[tokio::main]
//! async fn main() -> ldrlink::Result<()> {
//!     let config = BridgeConfig::new(LinkConfig::from_env()?);
//!     let bridge = Bridge::open_serial(&config)?;
//!
//!     let reply = bridge.issue_command("STATUS?").await;
//!     println!("{}", serde_json::to_string(&reply).unwrap_or_default());
//!
//!     let snapshot = bridge.snapshot();
//!     println!("light level: {}", snapshot.light_level());
//!
//!     bridge.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Live Updates
//!
//! ```no_run
//! use ldrlink::{Bridge, BridgeConfig};
//!
//! # async fn example() -> ldrlink::Result<()> {
//! let bridge = Bridge::open_serial(&BridgeConfig::default())?;
//! let mut watch = bridge.watch_state();
//!
//! while watch.changed().await.is_ok() {
//!     let state = watch.borrow_and_update().clone();
//!     if state.light_level().value() > 800 && state.alarm_enabled() {
//!         println!("bright light with alarm armed");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod framing;
pub mod link;
pub mod reader;
pub mod state;
pub mod telemetry;
pub mod types;

pub use bridge::{Bridge, CommandReply};
pub use command::{Command, CommandChannel, DeviceCommand};
pub use config::{BridgeConfig, LinkConfig, ReaderConfig};
pub use error::{CommandError, Error, LinkError, Result, ValueError};
pub use event::{EventBus, LinkEvent};
pub use reader::{ReaderLoop, StopReason};
pub use state::{DeviceState, LinkStatus, SharedDeviceState};
pub use telemetry::{Message, MessageKind, parse_line};
pub use types::{LightLevel, Switch};
