// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serial port transport.

use tokio::io::{ReadHalf, WriteHalf};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::config::LinkConfig;
use crate::error::LinkError;

use super::{StreamReader, StreamWriter, split};

/// Read half of a serial device link.
pub type SerialReader = StreamReader<ReadHalf<SerialStream>>;

/// Write half of a serial device link.
pub type SerialWriter = StreamWriter<WriteHalf<SerialStream>>;

/// Opens the configured serial port as 8N1 without flow control.
///
/// # Errors
///
/// Returns `LinkError::Serial` if the port cannot be opened or configured.
///
/// # Examples
///
/// ```no_run
/// use ldrlink::config::LinkConfig;
/// use ldrlink::link::serial;
///
/// # async fn example() -> Result<(), ldrlink::error::LinkError> {
/// let (_reader, _writer) = serial::open(&LinkConfig::new("/dev/ttyACM0"))?;
/// # Ok(())
/// # }
/// ```
pub fn open(config: &LinkConfig) -> Result<(SerialReader, SerialWriter), LinkError> {
    let stream = tokio_serial::new(config.port.as_str(), config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout)
        .open_native_async()
        .inspect_err(|e| {
            tracing::warn!(port = %config.port, error = %e, "Failed to open serial port");
        })?;

    tracing::info!(port = %config.port, baud = config.baud_rate, "Serial port opened");
    Ok(split(stream))
}
