//! Server-side request parsing.
//!
//! [`RequestParser`] puts a request-line state machine in front of the
//! shared [`MessageParser`] engine. The call sequence per message is
//! `parse_request_line` -> `parse_headers` -> `parse_content`, with
//! [`reset`](RequestParser::reset) between messages on a kept-alive
//! connection.

use bytes::Bytes;
use strand_core::{HeaderSink, HttpVersion, ParseError, RequestSink};

use crate::config::ParserConfig;
use crate::parser::{BodyFraming, Content, MessageParser};
use crate::tokens;

/// Request-line phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Start,
    Method,
    SpaceBeforeUri,
    Uri,
    SpaceBeforeVersion,
    Version,
    End,
}

/// Incremental HTTP/1.x request parser.
///
/// The method token is delivered verbatim, so custom verbs reach the sink
/// unchanged. Empty lines before the request line are skipped, as servers
/// are encouraged to do.
#[derive(Debug)]
pub struct RequestParser {
    core: MessageParser,
    state: LineState,
    method: String,
    uri: String,
}

impl RequestParser {
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self {
            core: MessageParser::new(config),
            state: LineState::Start,
            method: String::new(),
            uri: String::new(),
        }
    }

    /// True once the request line has been fully consumed.
    #[must_use]
    pub fn request_line_complete(&self) -> bool {
        self.state == LineState::End
    }

    /// True once the header block has been fully consumed.
    #[must_use]
    pub fn headers_complete(&self) -> bool {
        self.core.headers_complete()
    }

    /// True once the message body has ended.
    #[must_use]
    pub fn content_complete(&self) -> bool {
        self.core.content_complete()
    }

    /// True if the body uses chunked transfer encoding.
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.core.is_chunked()
    }

    /// True if the body length came from a `Content-Length` header.
    #[must_use]
    pub fn defined_content_length(&self) -> bool {
        self.core.defined_content_length()
    }

    /// The framing mode in effect.
    #[must_use]
    pub fn framing(&self) -> BodyFraming {
        self.core.framing()
    }

    /// Clear per-message state, keeping the configuration.
    pub fn reset(&mut self) {
        self.core.reset();
        self.state = LineState::Start;
        self.method.clear();
        self.uri.clear();
    }

    /// Force the terminal state for the current message. Idempotent.
    pub fn shutdown(&mut self) {
        self.state = LineState::End;
        self.core.shutdown();
    }

    /// Consume the request line, emitting it to the sink once complete.
    ///
    /// Returns `Ok(true)` when the line has been parsed and submitted,
    /// `Ok(false)` when the input window ran out.
    ///
    /// # Errors
    ///
    /// `BadRequest` on a malformed or oversize line, `InvalidState` if the
    /// line was already parsed. The parser is terminal after any error.
    pub fn parse_request_line<S: RequestSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        match self.run_request_line(sink, input) {
            Ok(done) => Ok(done),
            Err(err) => {
                self.shutdown();
                Err(err)
            }
        }
    }

    fn run_request_line<S: RequestSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        loop {
            match self.state {
                LineState::Start => {
                    let limit = self.core.config().max_request_line_size();
                    self.core.scanner.reset_limit(limit);
                    self.state = LineState::Method;
                }

                LineState::Method => {
                    let ch = loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF => {
                                // Ignore blank lines ahead of the request.
                                if self.core.scanner.buffer_position() != 0 {
                                    return Err(ParseError::BadRequest(
                                        "request line ended before the URI".to_string(),
                                    ));
                                }
                            }
                            Some(ch) if tokens::is_whitespace(ch) => break ch,
                            Some(ch) => self.core.scanner.put_byte(ch),
                            None => return Ok(false),
                        }
                    };
                    debug_assert!(tokens::is_whitespace(ch));

                    if self.core.scanner.buffer_position() == 0 {
                        return Err(ParseError::BadRequest(
                            "request line starts with whitespace".to_string(),
                        ));
                    }
                    self.method = self.core.scanner.string();
                    self.core.scanner.clear_buffer();
                    self.state = LineState::SpaceBeforeUri;
                }

                LineState::SpaceBeforeUri => {
                    match self.skip_whitespace(input, "request line has no URI")? {
                        Some(ch) => {
                            self.core.scanner.put_byte(ch);
                            self.state = LineState::Uri;
                        }
                        None => return Ok(false),
                    }
                }

                LineState::Uri => {
                    let done = loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF => {
                                return Err(ParseError::BadRequest(
                                    "request line has no protocol version".to_string(),
                                ));
                            }
                            Some(ch) if tokens::is_whitespace(ch) => break true,
                            Some(ch) => self.core.scanner.put_byte(ch),
                            None => break false,
                        }
                    };
                    if !done {
                        return Ok(false);
                    }

                    self.uri = self.core.scanner.string();
                    self.core.scanner.clear_buffer();
                    self.state = LineState::SpaceBeforeVersion;
                }

                LineState::SpaceBeforeVersion => {
                    match self.skip_whitespace(input, "request line has no protocol version")? {
                        Some(ch) => {
                            self.core.scanner.put_byte(ch);
                            self.state = LineState::Version;
                        }
                        None => return Ok(false),
                    }
                }

                LineState::Version => {
                    loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF => break,
                            Some(ch) => self.core.scanner.put_byte(ch),
                            None => return Ok(false),
                        }
                    }

                    let token = self.core.scanner.string();
                    let version = match HttpVersion::from_token(token.as_bytes()) {
                        Some(version) => version,
                        None => {
                            return Err(ParseError::BadRequest(format!(
                                "unknown protocol version: '{token}'"
                            )));
                        }
                    };
                    self.core.scanner.clear_buffer();
                    self.state = LineState::End;

                    tracing::trace!(method = %self.method, uri = %self.uri, "request line complete");
                    sink.on_request_line(&self.method, &self.uri, version)?;
                    return Ok(true);
                }

                LineState::End => {
                    return Err(ParseError::InvalidState(
                        "request line parser invoked in terminal state",
                    ));
                }
            }
        }
    }

    /// Skip spaces and tabs. `Ok(Some(ch))` is the first significant byte,
    /// `Ok(None)` means the window ran out; LF here is a peer error.
    fn skip_whitespace(
        &mut self,
        input: &mut Bytes,
        missing: &str,
    ) -> Result<Option<u8>, ParseError> {
        loop {
            match self.core.scanner.next(input)? {
                Some(ch) if tokens::is_whitespace(ch) => {}
                Some(ch) if ch == tokens::LF => {
                    return Err(ParseError::BadRequest(missing.to_string()));
                }
                Some(ch) => return Ok(Some(ch)),
                None => return Ok(None),
            }
        }
    }

    /// Consume the header block. See [`MessageParser::parse_headers`].
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying engine.
    pub fn parse_headers<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        self.core.parse_headers(sink, input)
    }

    /// Drive body consumption. See [`MessageParser::parse_content`].
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying engine.
    pub fn parse_content<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<Content, ParseError> {
        self.core.parse_content(sink, input)
    }
}
