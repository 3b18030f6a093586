//! Client-side response parsing.
//!
//! [`ResponseParser`] puts a status-line state machine in front of the
//! shared [`MessageParser`] engine. Responses differ from requests in one
//! framing rule: a response whose header block carries neither
//! `Content-Length` nor `Transfer-Encoding` reads its body to end-of-stream
//! (RFC 7230 3.3.3), so the parser promotes undetermined framing to
//! EOF-terminated when the sink permits a body. The caller reports the
//! transport's end-of-stream by calling [`shutdown`](ResponseParser::shutdown).

use bytes::Bytes;
use strand_core::{HeaderSink, HttpVersion, ParseError, ResponseSink};

use crate::config::ParserConfig;
use crate::parser::{BodyFraming, Content, MessageParser};
use crate::tokens;

/// Status codes that never carry a message body: 1xx, 204, 304.
#[inline]
#[must_use]
pub fn status_implies_no_body(status: u16) -> bool {
    matches!(status, 100..=199 | 204 | 304)
}

/// Status-line phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Start,
    Version,
    SpaceBeforeCode,
    Code,
    SpaceBeforeReason,
    Reason,
    End,
}

/// Incremental HTTP/1.x response parser.
#[derive(Debug)]
pub struct ResponseParser {
    core: MessageParser,
    state: LineState,
    version: Option<HttpVersion>,
    status: u16,
}

impl ResponseParser {
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self {
            core: MessageParser::new(config),
            state: LineState::Start,
            version: None,
            status: 0,
        }
    }

    /// True once the status line has been fully consumed.
    #[must_use]
    pub fn status_line_complete(&self) -> bool {
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
        self.version = None;
        self.status = 0;
    }

    /// Force the terminal state for the current message. Idempotent. This
    /// is also how the caller ends an EOF-terminated body when the
    /// transport reports end-of-stream.
    pub fn shutdown(&mut self) {
        self.state = LineState::End;
        self.core.shutdown();
    }

    /// Consume the status line, emitting it to the sink once complete.
    ///
    /// Returns `Ok(true)` when the line has been parsed and submitted,
    /// `Ok(false)` when the input window ran out.
    ///
    /// # Errors
    ///
    /// `BadRequest` on a malformed or oversize line, `InvalidState` if the
    /// line was already parsed. The parser is terminal after any error.
    pub fn parse_status_line<S: ResponseSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        match self.run_status_line(sink, input) {
            Ok(done) => Ok(done),
            Err(err) => {
                self.shutdown();
                Err(err)
            }
        }
    }

    fn run_status_line<S: ResponseSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        loop {
            match self.state {
                LineState::Start => {
                    let limit = self.core.config().max_request_line_size();
                    self.core.scanner.reset_limit(limit);
                    self.state = LineState::Version;
                }

                LineState::Version => {
                    let done = loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF => {
                                return Err(ParseError::BadRequest(
                                    "status line has no status code".to_string(),
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

                    let token = self.core.scanner.string();
                    self.version = match HttpVersion::from_token(token.as_bytes()) {
                        Some(version) => Some(version),
                        None => {
                            return Err(ParseError::BadRequest(format!(
                                "unknown protocol version: '{token}'"
                            )));
                        }
                    };
                    self.core.scanner.clear_buffer();
                    self.state = LineState::SpaceBeforeCode;
                }

                LineState::SpaceBeforeCode => {
                    let ch = loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if tokens::is_whitespace(ch) => {}
                            Some(ch) => break ch,
                            None => return Ok(false),
                        }
                    };
                    if ch == tokens::LF {
                        return Err(ParseError::BadRequest(
                            "status line has no status code".to_string(),
                        ));
                    }
                    self.core.scanner.put_byte(ch);
                    self.state = LineState::Code;
                }

                LineState::Code => {
                    let ch = loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF || tokens::is_whitespace(ch) => break ch,
                            Some(ch) => self.core.scanner.put_byte(ch),
                            None => return Ok(false),
                        }
                    };

                    let token = self.core.scanner.string();
                    let code: u16 = match token.parse() {
                        Ok(code) if (100..=599).contains(&code) => code,
                        _ => {
                            return Err(ParseError::BadRequest(format!(
                                "invalid status code: '{token}'"
                            )));
                        }
                    };
                    self.status = code;
                    self.core.scanner.clear_buffer();

                    if ch == tokens::LF {
                        // No reason phrase at all.
                        return self.finish_line(sink, "");
                    }
                    self.state = LineState::SpaceBeforeReason;
                }

                LineState::SpaceBeforeReason => {
                    let ch = loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if tokens::is_whitespace(ch) => {}
                            Some(ch) => break ch,
                            None => return Ok(false),
                        }
                    };
                    if ch == tokens::LF {
                        // "HTTP/1.1 200 " - an empty reason is fine.
                        return self.finish_line(sink, "");
                    }
                    self.core.scanner.put_byte(ch);
                    self.state = LineState::Reason;
                }

                LineState::Reason => {
                    loop {
                        match self.core.scanner.next(input)? {
                            Some(ch) if ch == tokens::LF => break,
                            Some(ch) => self.core.scanner.put_byte(ch),
                            None => return Ok(false),
                        }
                    }

                    let raw = self.core.scanner.string();
                    self.core.scanner.clear_buffer();
                    let reason = raw.trim_matches(|c| c == ' ' || c == '\t').to_string();
                    return self.finish_line(sink, &reason);
                }

                LineState::End => {
                    return Err(ParseError::InvalidState(
                        "status line parser invoked in terminal state",
                    ));
                }
            }
        }
    }

    fn finish_line<S: ResponseSink>(
        &mut self,
        sink: &mut S,
        reason: &str,
    ) -> Result<bool, ParseError> {
        self.state = LineState::End;
        let version = match self.version {
            Some(version) => version,
            None => {
                return Err(ParseError::InvalidState(
                    "status line finished without a version",
                ));
            }
        };
        tracing::trace!(status = self.status, "status line complete");
        sink.on_status_line(version, self.status, reason)?;
        Ok(true)
    }

    /// Consume the header block. See [`MessageParser::parse_headers`].
    ///
    /// A response whose header block fixes no framing while the sink
    /// permits a body is promoted to an EOF-terminated body here.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying engine.
    pub fn parse_headers<S: HeaderSink>(
        &mut self,
        sink: &mut S,
        input: &mut Bytes,
    ) -> Result<bool, ParseError> {
        let done = self.core.parse_headers(sink, input)?;
        if done && self.core.headers_complete() && self.core.framing() == BodyFraming::Unknown {
            self.core.set_eof_terminated();
        }
        Ok(done)
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
