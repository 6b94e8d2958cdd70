// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line framing for the device byte stream.
//!
//! The device writes `\r\n`-terminated text lines, but the transport hands
//! them over in arbitrary chunks: a read may end in the middle of a line, or
//! even in the middle of a multi-byte character. [`LineFramer`] keeps the
//! unterminated tail between calls and only decodes a line once its
//! terminator has arrived, so the produced lines never depend on where the
//! chunk boundaries fell.
//!
//! # Examples
//!
//! ```
//! use ldrlink::framing::LineFramer;
//!
//! let mut framer = LineFramer::new();
//!
//! let first: Vec<String> = framer.feed(b"DATA;LDR=5").collect();
//! assert!(first.is_empty());
//!
//! let second: Vec<String> = framer.feed(b"12\r\nSTATUS;MON=1\r\n").collect();
//! assert_eq!(second, vec!["DATA;LDR=512", "STATUS;MON=1"]);
//! ```

/// Default upper bound on the length of a single line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

const TERMINATOR: u8 = b'\n';

/// Splits a byte stream into terminator-stripped text lines.
///
/// `\n` ends a line and a `\r` right before it is stripped too. Invalid
/// UTF-8 is replaced with U+FFFD rather than failing the line.
///
/// A line longer than the configured maximum is dropped in full, up to and
/// including its terminator, so a device that never sends `\n` cannot grow
/// the carry-over buffer without bound.
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    max_line_length: usize,
    /// Set while skipping the remainder of an overlong line.
    discarding: bool,
}

impl LineFramer {
    /// Creates a framer with [`DEFAULT_MAX_LINE_LENGTH`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Creates a framer that drops lines longer than `max_line_length` bytes.
    ///
    /// A limit of zero is raised to one.
    #[must_use]
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(128),
            max_line_length: max_line_length.max(1),
            discarding: false,
        }
    }

    /// Feeds a chunk of bytes and returns the lines it completes.
    ///
    /// The iterator is lazy. Dropping it early still consumes the whole
    /// chunk: lines not yet yielded are lost, but the trailing partial line is
    /// kept for the next call.
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> Lines<'a> {
        Lines {
            framer: self,
            input: bytes,
        }
    }

    /// Returns the number of bytes buffered from an unterminated line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the configured line length limit.
    #[must_use]
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Drops any buffered partial line.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    fn extend(&mut self, bytes: &[u8]) {
        if self.discarding {
            return;
        }
        if self.buffer.len() + bytes.len() > self.max_line_length {
            tracing::warn!(
                limit = self.max_line_length,
                "Dropping line longer than the framing limit"
            );
            self.buffer.clear();
            self.discarding = true;
            return;
        }
        self.buffer.extend_from_slice(bytes);
    }

    fn finish_line(&mut self) -> Option<String> {
        if std::mem::take(&mut self.discarding) {
            self.buffer.clear();
            return None;
        }

        let mut raw = std::mem::take(&mut self.buffer);
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        Some(decode_lossy(raw))
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the lines completed by one [`LineFramer::feed`] call.
#[derive(Debug)]
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
    input: &'a [u8],
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.input.is_empty() {
            let Some(pos) = self.input.iter().position(|&b| b == TERMINATOR) else {
                self.framer.extend(self.input);
                self.input = &[];
                break;
            };

            let (head, rest) = self.input.split_at(pos);
            self.input = &rest[1..];
            self.framer.extend(head);

            if let Some(line) = self.framer.finish_line() {
                return Some(line);
            }
        }
        None
    }
}

impl Drop for Lines<'_> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}

fn decode_lossy(raw: Vec<u8>) -> String {
    String::from_utf8(raw)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(framer: &mut LineFramer, chunks: &[&[u8]]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|chunk| framer.feed(chunk).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn splits_complete_lines() {
        let mut framer = LineFramer::new();
        let lines: Vec<_> = framer.feed(b"DATA;LDR=1\nDATA;LDR=2\n").collect();
        assert_eq!(lines, vec!["DATA;LDR=1", "DATA;LDR=2"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn strips_crlf() {
        let mut framer = LineFramer::new();
        let lines: Vec<_> = framer.feed(b"STATUS;MON=0\r\n").collect();
        assert_eq!(lines, vec!["STATUS;MON=0"]);
    }

    #[test]
    fn lone_carriage_return_is_kept_mid_line() {
        let mut framer = LineFramer::new();
        let lines: Vec<_> = framer.feed(b"a\rb\n").collect();
        assert_eq!(lines, vec!["a\rb"]);
    }

    #[test]
    fn carries_partial_line_across_calls() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"DATA;LD").count(), 0);
        assert_eq!(framer.pending(), 7);

        let lines: Vec<_> = framer.feed(b"R=77\r").collect();
        assert!(lines.is_empty());

        let lines: Vec<_> = framer.feed(b"\nDATA").collect();
        assert_eq!(lines, vec!["DATA;LDR=77"]);
        assert_eq!(framer.pending(), 4);
    }

    #[test]
    fn empty_chunk_yields_nothing() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"").count(), 0);
    }

    #[test]
    fn blank_lines_are_yielded_as_empty() {
        let mut framer = LineFramer::new();
        let lines: Vec<_> = framer.feed(b"\r\n\nx\n").collect();
        assert_eq!(lines, vec!["", "", "x"]);
    }

    #[test]
    fn chunk_boundaries_do_not_change_output() {
        let overlong = "x".repeat(36);
        let text = format!(
            "DATA;LDR=512;MON=1\r\nSTATUS;ALARM=0\r\n\r\n{overlong}\r\n\
             noise é\r\nDATA;LDR=7\r\npartial"
        );
        let stream = text.as_bytes();

        let mut whole = LineFramer::with_max_line_length(24);
        let expected: Vec<_> = whole.feed(stream).collect();
        assert_eq!(expected.len(), 5);
        assert!(expected.iter().all(|line| !line.contains('x')));

        for split in 0..=stream.len() {
            let (a, b) = stream.split_at(split);
            let mut framer = LineFramer::with_max_line_length(24);
            assert_eq!(feed_all(&mut framer, &[a, b]), expected, "split at {split}");
        }

        let mut framer = LineFramer::with_max_line_length(24);
        let bytewise: Vec<&[u8]> = stream.chunks(1).collect();
        assert_eq!(feed_all(&mut framer, &bytewise), expected);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let mut framer = LineFramer::new();
        let bytes = "luz é\n".as_bytes();
        let e_acute = bytes.len() - 2;

        assert_eq!(framer.feed(&bytes[..e_acute]).count(), 0);
        let lines: Vec<_> = framer.feed(&bytes[e_acute..]).collect();
        assert_eq!(lines, vec!["luz é"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut framer = LineFramer::new();
        let lines: Vec<_> = framer.feed(b"DATA;LDR=1\xff\xfe\n").collect();
        assert_eq!(lines, vec!["DATA;LDR=1\u{FFFD}\u{FFFD}"]);
    }

    #[test]
    fn overlong_line_is_dropped_until_terminator() {
        let mut framer = LineFramer::with_max_line_length(8);
        let lines = feed_all(&mut framer, &[b"0123", b"456789ab", b"cd\nok\n"]);
        assert_eq!(lines, vec!["ok"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn line_at_exact_limit_is_kept() {
        let mut framer = LineFramer::with_max_line_length(4);
        let lines: Vec<_> = framer.feed(b"abcd\nabcde\n").collect();
        assert_eq!(lines, vec!["abcd"]);
    }

    #[test]
    fn dropping_iterator_early_keeps_trailing_fragment() {
        let mut framer = LineFramer::new();
        {
            let mut lines = framer.feed(b"one\ntwo\nthr");
            assert_eq!(lines.next().as_deref(), Some("one"));
        }
        assert_eq!(framer.pending(), 3);

        let lines: Vec<_> = framer.feed(b"ee\n").collect();
        assert_eq!(lines, vec!["three"]);
    }

    #[test]
    fn reset_discards_partial_line() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"DATA;LDR=").count(), 0);
        framer.reset();
        let lines: Vec<_> = framer.feed(b"9\n").collect();
        assert_eq!(lines, vec!["9"]);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let framer = LineFramer::with_max_line_length(0);
        assert_eq!(framer.max_line_length(), 1);
    }
}
