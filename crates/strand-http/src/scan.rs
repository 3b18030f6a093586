//! Byte scanner: the single chokepoint between input windows and the
//! state machines.
//!
//! The scanner reads one byte at a time from the caller's input, normalizes
//! CRLF to LF, accounts every consumed byte against the current size-limit
//! checkpoint, and accumulates the token being built. The accumulation
//! buffer only ever holds the current token (one header name or one header
//! value at a time), never the stream.

use bytes::{Buf, Bytes};
use strand_core::ParseError;

use crate::tokens;

#[derive(Debug)]
pub(crate) struct Scanner {
    buffer: Vec<u8>,
    /// Bytes allowed since the last checkpoint.
    limit: usize,
    /// Bytes consumed since the last checkpoint.
    consumed: usize,
    /// A CR was consumed; the next byte must be LF.
    saw_cr: bool,
}

impl Scanner {
    pub(crate) fn new(initial_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(initial_buffer_size),
            limit: 0,
            consumed: 0,
            saw_cr: false,
        }
    }

    /// Install a new size-limit checkpoint. Called at the start of each
    /// bounded phase (header block, chunk header, request line).
    pub(crate) fn reset_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.consumed = 0;
    }

    /// Deliver the next byte of the input window, or `None` when the window
    /// is exhausted.
    ///
    /// CR never escapes this function: it is consumed, remembered, and the
    /// byte after it must be LF. Control bytes other than CR, LF and TAB are
    /// rejected outright.
    pub(crate) fn next(&mut self, input: &mut Bytes) -> Result<Option<u8>, ParseError> {
        loop {
            if !input.has_remaining() {
                return Ok(None);
            }
            if self.consumed >= self.limit {
                return Err(ParseError::BadRequest(format!(
                    "size limit exceeded: {}",
                    self.limit
                )));
            }

            let ch = input.get_u8();
            self.consumed += 1;

            if self.saw_cr {
                if ch != tokens::LF {
                    return Err(ParseError::BadRequest(format!(
                        "LF did not follow CR: 0x{ch:02x}"
                    )));
                }
                self.saw_cr = false;
                return Ok(Some(ch));
            }

            if ch < tokens::SPACE {
                if ch == tokens::CR {
                    self.saw_cr = true;
                    continue;
                }
                if ch == tokens::LF || ch == tokens::TAB {
                    return Ok(Some(ch));
                }
                return Err(ParseError::BadRequest(format!(
                    "invalid control character: 0x{ch:02x}"
                )));
            }

            return Ok(Some(ch));
        }
    }

    /// Append a byte to the accumulation buffer.
    #[inline]
    pub(crate) fn put_byte(&mut self, ch: u8) {
        self.buffer.push(ch);
    }

    /// Length of the token built so far.
    #[inline]
    pub(crate) fn buffer_position(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub(crate) fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// The accumulated token. ASCII expected; anything else comes through
    /// lossily.
    pub(crate) fn string(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// The accumulated token with surrounding whitespace removed. An empty
    /// result is a peer error.
    pub(crate) fn trimmed_string(&self) -> Result<String, ParseError> {
        let bytes = &self.buffer[..];
        let start = bytes.iter().position(|&b| !tokens::is_whitespace(b));
        let end = bytes.iter().rposition(|&b| !tokens::is_whitespace(b));
        match (start, end) {
            (Some(start), Some(end)) => {
                Ok(String::from_utf8_lossy(&bytes[start..=end]).into_owned())
            }
            _ => Err(ParseError::BadRequest(
                "empty token after trimming".to_string(),
            )),
        }
    }

    /// Clear all per-message scanning state. The buffer keeps its capacity.
    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
        self.consumed = 0;
        self.saw_cr = false;
    }
}
