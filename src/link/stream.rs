// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Link halves over tokio byte streams.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::error::LinkError;

use super::{LinkReader, LinkWriter, ReadOutcome};

/// Splits a duplex stream into link halves.
///
/// # Examples
///
/// ```
/// use ldrlink::link::split;
///
/// let (device_side, _host_side) = tokio::io::duplex(256);
/// let (_reader, _writer) = split(device_side);
/// ```
pub fn split<S>(stream: S) -> (StreamReader<ReadHalf<S>>, StreamWriter<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    (StreamReader::new(read_half), StreamWriter::new(write_half))
}

/// [`LinkReader`] over any `AsyncRead`.
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
}

impl<R> StreamReader<R> {
    /// Wraps a byte source.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwraps the byte source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> LinkReader for StreamReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<ReadOutcome, LinkError> {
        if buf.is_empty() {
            return Ok(ReadOutcome::Idle);
        }

        match tokio::time::timeout(timeout, self.inner.read(buf)).await {
            Err(_) => Ok(ReadOutcome::Idle),
            Ok(Ok(0)) => Ok(ReadOutcome::Closed),
            Ok(Ok(n)) => Ok(ReadOutcome::Data(n)),
            Ok(Err(e)) => match e.kind() {
                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted => {
                    Ok(ReadOutcome::Idle)
                }
                ErrorKind::UnexpectedEof => Ok(ReadOutcome::Closed),
                _ => Err(LinkError::Io(e)),
            },
        }
    }
}

/// [`LinkWriter`] over any `AsyncWrite`.
///
/// A peer that has gone away (broken pipe, reset, zero-length write) is
/// reported as `LinkError::Closed`.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
}

impl<W> StreamWriter<W> {
    /// Wraps a byte sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwraps the byte sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> LinkWriter for StreamWriter<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.inner.write_all(bytes).await.map_err(write_error)?;
        self.inner.flush().await.map_err(write_error)
    }
}

fn write_error(e: std::io::Error) -> LinkError {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::WriteZero => {
            LinkError::Closed
        }
        _ => LinkError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn reads_available_bytes() {
        let (device, mut host) = tokio::io::duplex(64);
        let (mut reader, _writer) = split(device);

        host.write_all(b"DATA;LDR=1\r\n").await.unwrap();

        let mut buf = [0u8; 64];
        let outcome = reader.read_chunk(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Data(12));
        assert_eq!(&buf[..12], b"DATA;LDR=1\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn silence_is_idle() {
        let (device, _host) = tokio::io::duplex(64);
        let (mut reader, _writer) = split(device);

        let mut buf = [0u8; 64];
        let outcome = reader.read_chunk(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Idle);
    }

    #[tokio::test]
    async fn end_of_stream_is_closed() {
        let (device, host) = tokio::io::duplex(64);
        let (mut reader, _writer) = split(device);
        drop(host);

        let mut buf = [0u8; 64];
        let outcome = reader.read_chunk(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Closed);
    }

    #[tokio::test]
    async fn writer_sends_and_flushes() {
        let (device, mut host) = tokio::io::duplex(64);
        let (_reader, mut writer) = split(device);

        writer.send(b"STATUS?\n").await.unwrap();

        let mut buf = [0u8; 8];
        host.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"STATUS?\n");
    }

    #[tokio::test]
    async fn write_to_closed_peer_is_closed() {
        let (device, host) = tokio::io::duplex(64);
        let (_reader, mut writer) = split(device);
        drop(host);

        let err = writer.send(b"ALARM_OFF\n").await.unwrap_err();
        assert!(matches!(err, LinkError::Closed));
    }

    /// Fails every read with a fixed error kind.
    struct FailingRead(ErrorKind);

    impl AsyncRead for FailingRead {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::from(self.0)))
        }
    }

    #[tokio::test]
    async fn native_timeouts_are_idle() {
        for kind in [ErrorKind::TimedOut, ErrorKind::WouldBlock, ErrorKind::Interrupted] {
            let mut reader = StreamReader::new(FailingRead(kind));
            let mut buf = [0u8; 16];
            let outcome = reader.read_chunk(&mut buf, TIMEOUT).await.unwrap();
            assert_eq!(outcome, ReadOutcome::Idle, "{kind:?}");
        }
    }

    #[tokio::test]
    async fn unexpected_eof_is_closed() {
        let mut reader = StreamReader::new(FailingRead(ErrorKind::UnexpectedEof));
        let mut buf = [0u8; 16];
        let outcome = reader.read_chunk(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Closed);
    }

    #[tokio::test]
    async fn other_read_errors_are_reported() {
        let mut reader = StreamReader::new(FailingRead(ErrorKind::PermissionDenied));
        let mut buf = [0u8; 16];
        let err = reader.read_chunk(&mut buf, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, LinkError::Io(e) if e.kind() == ErrorKind::PermissionDenied));
    }

    #[test]
    fn other_write_errors_stay_io() {
        let err = write_error(std::io::Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(err, LinkError::Io(_)));
    }
}
