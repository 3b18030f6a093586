//! Incremental HTTP/1.x header and body parsing.
//!
//! [`MessageParser`] is the shared engine under both the request and the
//! response parser. It consumes caller-supplied [`Bytes`] windows, emits
//! header pairs to a [`HeaderSink`], and hands body bytes back as read-only
//! views of the input. It performs no I/O, never blocks, and never reads
//! past the supplied window: "need more input" is a return value, not a
//! wait.
//!
//! # Incremental operation
//!
//! The caller feeds one window at a time. `parse_headers` returns `false`
//! when the window ran dry mid-block; `parse_content` returns
//! [`Content::NeedInput`] likewise. On the next call the state machine
//! resumes exactly where it stopped, so a message may arrive split at any
//! byte boundary.
//!
//! # Zero-copy bodies
//!
//! [`Content::Data`] slices share the caller's buffer via [`Bytes`]; the
//! parser copies no body byte. Slices stay valid for as long as the backing
//! allocation lives, and arrive in wire order.

use bytes::{Buf, Bytes};
use strand_core::{HeaderSink, ParseError};

use crate::config::ParserConfig;
use crate::scan::Scanner;
use crate::tokens;

/// Chunk-size and extension lines must fit this many bytes.
const CHUNK_HEADER_LIMIT: usize = 256;

/// Header-block phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    Start,
    InName,
    Space,
    InValue,
    End,
}

/// Chunked-transfer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    Start,
    Size,
    Params,
    Body,
    Lf,
    Trailers,
    End,
}

/// How the end of the message body is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// No framing header seen yet.
    Unknown,
    /// The message has no body.
    None,
    /// `Content-Length` with a positive value.
    Length,
    /// `Transfer-Encoding: chunked`.
    Chunked,
    /// The payload delimits itself. Reserved extension point; not parsed.
    SelfDefining,
    /// The body runs until the transport reports end-of-stream.
    EofTerminated,
}

/// Result of a [`MessageParser::parse_content`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Body bytes: a read-only view of the input window.
    Data(Bytes),
    /// The message body has ended.
    Done,
    /// The input window is exhausted, or the sink asked for control during
    /// trailer headers. Call again, with more input if the window was dry.
    NeedInput,
}

/// Incremental HTTP/1.x header and body parser.
///
/// One instance serves one connection and is reused across messages:
/// [`reset`](Self::reset) clears per-message state while keeping the
/// configuration and buffer capacity. A parser is not safe for concurrent
/// use; callers serialize calls on an instance.
///
/// After any error the parser is terminal: every further call fails until
/// `reset`. [`shutdown`](Self::shutdown) reaches the same terminal state
/// manually, and is how the caller ends an EOF-terminated body.
#[derive(Debug)]
pub struct MessageParser {
    config: ParserConfig,
    pub(crate) scanner: Scanner,

    header_state: HeaderState,
    chunk_state: ChunkState,
    framing: BodyFraming,

    /// Total expected and delivered body bytes. Only meaningful in
    /// `Length` framing.
    content_length: u64,
    content_position: u64,

    /// Size of the current chunk and bytes delivered from it. Only
    /// meaningful in `Chunked` framing.
    chunk_length: usize,
    chunk_position: usize,

    /// The most recently parsed header name, awaiting its value.
    header_name: String,
}

impl MessageParser {
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        let scanner = Scanner::new(config.initial_buffer_size());
        Self {
            config,
            scanner,
            header_state: HeaderState::Start,
            chunk_state: ChunkState::Start,
            framing: BodyFraming::Unknown,
            content_length: 0,
            content_position: 0,
            chunk_length: 0,
            chunk_position: 0,
            header_name: String::new(),
        }
    }

    pub(crate) fn config(&self) -> &ParserConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Status queries
    // ------------------------------------------------------------------

    /// True once the header block (or trailer block) has been fully
    /// consumed.
    #[must_use]
    pub fn headers_complete(&self) -> bool {
        self.header_state == HeaderState::End
    }

    /// True once the message body has ended.
    #[must_use]
    pub fn content_complete(&self) -> bool {
        match self.framing {
            BodyFraming::None => true,
            BodyFraming::EofTerminated => self.chunk_state == ChunkState::End,
            _ => false,
        }
    }

    /// True if the body uses chunked transfer encoding.
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.framing == BodyFraming::Chunked
    }

    /// True while trailer headers of a chunked body are being parsed.
    #[must_use]
    pub fn in_chunked_trailers(&self) -> bool {
        self.chunk_state == ChunkState::Trailers
    }

    /// True if the body length came from a `Content-Length` header.
    #[must_use]
    pub fn defined_content_length(&self) -> bool {
        self.framing == BodyFraming::Length
    }

    /// The framing mode in effect. Fixed once `headers_complete` is true.
    #[must_use]
    pub fn framing(&self) -> BodyFraming {
        self.framing
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Clear per-message state. Configuration and buffer capacity are
    /// preserved; this is the only way out of the terminal state.
    pub fn reset(&mut self) {
        self.scanner.reset();
        self.header_state = HeaderState::Start;
        self.chunk_state = ChunkState::Start;
        self.framing = BodyFraming::Unknown;
        self.content_length = 0;
        self.content_position = 0;
        self.chunk_length = 0;
        self.chunk_position = 0;
        self.header_name.clear();
    }

    /// Force the terminal state for the current message. Idempotent. Used
    /// on fatal errors, and by callers to end an EOF-terminated body when
    /// the transport reports end-of-stream.
    pub fn shutdown(&mut self) {
        self.header_state = HeaderState::End;
        self.chunk_state = ChunkState::End;
        self.framing = BodyFraming::EofTerminated;
    }

    /// Promote undetermined framing to an EOF-terminated body. Responses
    /// without framing headers read to end-of-stream; the response parser
    /// applies this at the end of the header block.
    pub(crate) fn set_eof_terminated(&mut self) {
        if self.framing == BodyFraming::Unknown {
            self.framing = BodyFraming::EofTerminated;
        }
    }

    // ------------------------------------------------------------------
    // Header block
    // ------------------------------------------------------------------

    /// Consume the header block, emitting each `(name, value)` pair to the
    /// sink.
    ///
    /// Returns `Ok(true)` when the block is fully consumed or when the sink
    /// asked for control; [`headers_complete`](Self::headers_complete)
    /// distinguishes the two. Returns `Ok(false)` when the input window ran
    /// out; supply more bytes and call again.
    ///
    /// # Errors
    ///
    /// `BadRequest` on malformed syntax or an exceeded size limit,
    /// `InvalidState` if called after the block already ended. The parser
    /// is terminal after any error.
    pub fn parse_headers<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        match self.run_headers(sink, input) {
            Ok(done) => Ok(done),
            Err(err) => {
                self.shutdown();
                Err(err)
            }
        }
    }

    pub(crate) fn run_headers<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        loop {
            match self.header_state {
                HeaderState::Start => {
                    self.scanner.reset_limit(self.config.header_size_limit());
                    self.header_state = HeaderState::InName;
                }

                HeaderState::InName => {
                    let ch = loop {
                        match self.scanner.next(input)? {
                            Some(ch) if ch == tokens::COLON || ch == tokens::LF => break ch,
                            Some(ch) => self.scanner.put_byte(ch),
                            None => return Ok(false),
                        }
                    };

                    // A bare LF with nothing accumulated is the blank line
                    // ending the block.
                    if ch == tokens::LF && self.scanner.buffer_position() == 0 {
                        self.header_state = HeaderState::End;

                        if self.chunk_state == ChunkState::Trailers {
                            // Trailer block done: the whole message is done.
                            self.shutdown();
                        } else if self.framing == BodyFraming::Unknown && !sink.may_have_body() {
                            self.shutdown();
                        }
                        tracing::trace!(framing = ?self.framing, "header block complete");
                        return Ok(true);
                    }

                    if ch == tokens::LF {
                        // Valueless header.
                        let name = self.scanner.string();
                        self.scanner.clear_buffer();
                        if sink.on_header(&name, "")? {
                            return Ok(true);
                        }
                        continue;
                    }

                    self.header_name = self.scanner.string();
                    self.scanner.clear_buffer();
                    self.header_state = HeaderState::Space;
                }

                HeaderState::Space => {
                    let ch = loop {
                        match self.scanner.next(input)? {
                            Some(ch) if tokens::is_whitespace(ch) => {}
                            Some(ch) => break ch,
                            None => return Ok(false),
                        }
                    };

                    if ch == tokens::LF {
                        return Err(ParseError::BadRequest(format!(
                            "missing value for header {}",
                            self.header_name
                        )));
                    }

                    self.scanner.put_byte(ch);
                    self.header_state = HeaderState::InValue;
                }

                HeaderState::InValue => {
                    loop {
                        match self.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF => break,
                            Some(ch) => self.scanner.put_byte(ch),
                            None => return Ok(false),
                        }
                    }

                    let value = self.scanner.trimmed_string()?;
                    self.scanner.clear_buffer();

                    // Trailers must not influence framing.
                    if self.chunk_state != ChunkState::Trailers {
                        self.detect_framing(&value)?;
                    }

                    let yield_control = sink.on_header(&self.header_name, &value)?;
                    self.header_state = HeaderState::InName;
                    if yield_control {
                        return Ok(true);
                    }
                }

                HeaderState::End => {
                    return Err(ParseError::InvalidState(
                        "header parser invoked in terminal state",
                    ));
                }
            }
        }
    }

    /// Inspect a completed header for `Transfer-Encoding` /
    /// `Content-Length`. First framing header wins; later ones no longer
    /// run through here.
    fn detect_framing(&mut self, value: &str) -> Result<(), ParseError> {
        if self.framing != BodyFraming::Unknown {
            return Ok(());
        }

        if self.header_name.eq_ignore_ascii_case("transfer-encoding") {
            if !value.eq_ignore_ascii_case("chunked") {
                return Err(ParseError::BadRequest(format!(
                    "Unknown Transfer-Encoding: {value}"
                )));
            }
            self.framing = BodyFraming::Chunked;
        } else if self.header_name.eq_ignore_ascii_case("content-length") {
            if !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::BadRequest(format!(
                    "Invalid Content-Length: '{value}'"
                )));
            }
            let length: u64 = value.parse().map_err(|_| {
                ParseError::BadRequest(format!("Invalid Content-Length: '{value}'"))
            })?;

            if length == 0 {
                self.framing = BodyFraming::None;
            } else {
                self.content_length = length;
                self.framing = BodyFraming::Length;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Body
    // ------------------------------------------------------------------

    /// Drive body consumption according to the detected framing mode.
    ///
    /// Returns [`Content::Data`] with a read-only view of the input when at
    /// least one body byte is available, [`Content::NeedInput`] when the
    /// window ran out, and [`Content::Done`] when the message has ended.
    /// The sink only receives callbacks here for trailer headers of a
    /// chunked body.
    ///
    /// # Errors
    ///
    /// `BadRequest` on malformed chunked encoding or an oversize chunk;
    /// `InvalidState` for the unsupported self-defining mode. The parser is
    /// terminal after any error.
    pub fn parse_content<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<Content, ParseError> {
        match self.run_content(sink, input) {
            Ok(content) => Ok(content),
            Err(err) => {
                self.shutdown();
                Err(err)
            }
        }
    }

    fn run_content<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<Content, ParseError> {
        if self.chunk_state == ChunkState::End {
            return Ok(Content::Done);
        }

        match self.framing {
            BodyFraming::Unknown => {
                // No framing header arrived and the sink still permitted a
                // body. Requests carry no body in that case (RFC 7230
                // 3.3.3); responses are promoted to EofTerminated before
                // this point.
                self.shutdown();
                Ok(Content::Done)
            }
            BodyFraming::None => {
                self.shutdown();
                Ok(Content::Done)
            }
            BodyFraming::Length => Ok(self.length_content(input)),
            BodyFraming::Chunked => self.chunked_content(sink, input),
            BodyFraming::EofTerminated => {
                if input.has_remaining() {
                    Ok(Content::Data(submit_buffer(input)))
                } else {
                    Ok(Content::NeedInput)
                }
            }
            BodyFraming::SelfDefining => Err(ParseError::InvalidState(
                "self-defining content is not supported",
            )),
        }
    }

    fn length_content(&mut self, input: &mut Bytes) -> Content {
        if !input.has_remaining() {
            return Content::NeedInput;
        }

        let remaining = self.content_length - self.content_position;
        let window = input.remaining() as u64;

        if window >= remaining {
            self.content_position += remaining;
            let slice = submit_partial_buffer(input, remaining as usize);
            self.shutdown();
            tracing::trace!(bytes = slice.len(), "content-length body complete");
            Content::Data(slice)
        } else {
            self.content_position += window;
            Content::Data(submit_buffer(input))
        }
    }

    fn chunked_content<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<Content, ParseError> {
        loop {
            match self.chunk_state {
                ChunkState::Start => {
                    // Chunk size and extensions must stay small.
                    self.scanner.reset_limit(CHUNK_HEADER_LIMIT);
                    self.chunk_state = ChunkState::Size;
                }

                ChunkState::Size => {
                    debug_assert_eq!(self.chunk_position, 0);
                    loop {
                        let ch = match self.scanner.next(input)? {
                            Some(ch) => ch,
                            None => return Ok(Content::NeedInput),
                        };

                        if tokens::is_whitespace(ch) || ch == tokens::SEMICOLON {
                            self.chunk_state = ChunkState::Params;
                            break;
                        }
                        if ch == tokens::LF {
                            self.finish_chunk_header();
                            break;
                        }

                        let digit = tokens::hex_digit(ch)?;
                        self.chunk_length = match self
                            .chunk_length
                            .checked_mul(16)
                            .and_then(|length| length.checked_add(digit))
                        {
                            Some(length) if length <= self.config.max_chunk_size() => length,
                            _ => {
                                return Err(ParseError::BadRequest(format!(
                                    "chunk length too large: limit is {}",
                                    self.config.max_chunk_size()
                                )));
                            }
                        };
                    }
                }

                ChunkState::Params => {
                    // Chunk extensions are accepted and discarded.
                    loop {
                        match self.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF => break,
                            Some(_) => {}
                            None => return Ok(Content::NeedInput),
                        }
                    }
                    self.finish_chunk_header();
                }

                ChunkState::Body => {
                    if !input.has_remaining() {
                        return Ok(Content::NeedInput);
                    }

                    let remaining = self.chunk_length - self.chunk_position;
                    let window = input.remaining();

                    if remaining <= window {
                        let slice = submit_partial_buffer(input, remaining);
                        self.chunk_length = 0;
                        self.chunk_position = 0;
                        self.chunk_state = ChunkState::Lf;
                        return Ok(Content::Data(slice));
                    }

                    self.chunk_position += window;
                    return Ok(Content::Data(submit_buffer(input)));
                }

                ChunkState::Lf => {
                    let ch = match self.scanner.next(input)? {
                        Some(ch) => ch,
                        None => return Ok(Content::NeedInput),
                    };
                    if ch != tokens::LF {
                        return Err(ParseError::BadRequest(format!(
                            "bad chunked encoding: expected LF, got 0x{ch:02x}"
                        )));
                    }
                    self.chunk_state = ChunkState::Start;
                }

                ChunkState::Trailers => {
                    if self.run_headers(sink, input)? {
                        if self.chunk_state == ChunkState::End {
                            tracing::trace!("chunked message complete");
                            return Ok(Content::Done);
                        }
                        // The sink asked for control mid-trailers.
                        return Ok(Content::NeedInput);
                    }
                    return Ok(Content::NeedInput);
                }

                ChunkState::End => return Ok(Content::Done),
            }
        }
    }

    /// A chunk header just ended. Zero size means trailer headers follow.
    fn finish_chunk_header(&mut self) {
        if self.chunk_length == 0 {
            self.header_state = HeaderState::Start;
            self.chunk_state = ChunkState::Trailers;
            tracing::trace!("entering chunked trailers");
        } else {
            self.chunk_state = ChunkState::Body;
        }
    }
}

/// Hand the caller the whole remaining window, advancing the input to its
/// limit. Zero-copy: the returned [`Bytes`] aliases the input.
fn submit_buffer(input: &mut Bytes) -> Bytes {
    let len = input.len();
    input.split_to(len)
}

/// Hand the caller exactly the next `size` bytes, advancing the input past
/// them. Zero-copy.
fn submit_partial_buffer(input: &mut Bytes, size: usize) -> Bytes {
    input.split_to(size)
}
