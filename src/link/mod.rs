// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device link transports.
//!
//! The device link is a duplex byte stream, split into two halves with
//! different owners:
//!
//! - [`LinkReader`] is owned by the reader loop alone
//! - [`LinkWriter`] is shared by command senders behind a lock
//!
//! # Transports
//!
//! - [`StreamReader`]/[`StreamWriter`]: any tokio `AsyncRead`/`AsyncWrite`
//!   stream, split with [`split`]. Handy for TCP bridges and tests.
//! - `serial::open`: a serial port (requires the `serial` feature)

mod stream;

#[cfg(feature = "serial")]
pub mod serial;

pub use stream::{StreamReader, StreamWriter, split};

use std::future::Future;
use std::time::Duration;

use crate::error::LinkError;

/// Result of one bounded read from the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written into the buffer.
    Data(usize),
    /// Nothing arrived before the timeout. This is normal between telemetry
    /// lines.
    Idle,
    /// The link is gone for good (end of stream, port removed).
    Closed,
}

/// Read half of the device link.
pub trait LinkReader: Send + 'static {
    /// Reads whatever is available into `buf`, waiting at most `timeout`.
    ///
    /// A timeout is reported as [`ReadOutcome::Idle`], never as an error.
    ///
    /// # Errors
    ///
    /// Returns `LinkError` if the transport fails. The failure may be
    /// transient; callers are expected to retry.
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<ReadOutcome, LinkError>> + Send;
}

/// Write half of the device link.
pub trait LinkWriter: Send + 'static {
    /// Writes all of `bytes` and flushes them.
    ///
    /// # Errors
    ///
    /// Returns `LinkError` if the transport fails.
    fn send(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), LinkError>> + Send;
}
