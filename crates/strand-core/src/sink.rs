//! Caller-supplied callback interfaces.
//!
//! The parser pushes parsed elements into a sink rather than building a
//! message object of its own. A sink is passed to every parse call, so the
//! parser holds no borrow of caller state between calls.

use crate::error::ParseError;
use crate::version::HttpVersion;

/// Receives header pairs as the parser emits them.
///
/// `on_header` is invoked for every header in wire order, including trailer
/// headers after a chunked body. Returning `Ok(true)` hands control back to
/// the caller; parsing resumes exactly where it left off on the next call.
///
/// Framing detection inside the parser is first-wins: once a framing header
/// has fixed the body mode, later `Content-Length` / `Transfer-Encoding`
/// headers no longer change it. A sink that wants the stricter
/// reject-on-ambiguity policy can track the headers it has seen and return
/// `Err(ParseError::BadRequest(..))` from `on_header`.
pub trait HeaderSink {
    /// Called for each parsed `(name, value)` pair. Valueless headers are
    /// delivered with an empty value.
    fn on_header(&mut self, name: &str, value: &str) -> Result<bool, ParseError>;

    /// Consulted once, when the header block ends with the body framing
    /// still undetermined. Returning `false` completes the message with no
    /// body.
    fn may_have_body(&self) -> bool;
}

/// Sink for server-side parsing: a request line, then headers.
pub trait RequestSink: HeaderSink {
    /// Called once per message with the parsed request line. The method is
    /// delivered verbatim, so custom verbs reach the caller unchanged.
    fn on_request_line(
        &mut self,
        method: &str,
        uri: &str,
        version: HttpVersion,
    ) -> Result<(), ParseError>;
}

/// Sink for client-side parsing: a status line, then headers.
pub trait ResponseSink: HeaderSink {
    /// Called once per message with the parsed status line. The reason
    /// phrase may be empty.
    fn on_status_line(
        &mut self,
        version: HttpVersion,
        status: u16,
        reason: &str,
    ) -> Result<(), ParseError>;
}
