//! Incremental, zero-copy HTTP/1.x message parsing.
//!
//! This crate is a streaming push parser: the caller feeds byte windows as
//! they arrive from a transport, and the parser emits header pairs to a
//! caller-supplied sink and body bytes as read-only views of the input. It
//! performs no I/O, never blocks, and never copies a body byte.
//!
//! # Components
//!
//! - [`MessageParser`] - the shared header/body engine
//! - [`RequestParser`] - request line + headers + body (server side)
//! - [`ResponseParser`] - status line + headers + body (client side)
//! - [`ParserConfig`] - per-connection size limits
//!
//! # Framing
//!
//! All four HTTP/1.x body framings are handled: `Content-Length`, chunked
//! transfer (including extensions and trailers), bodyless messages, and
//! EOF-terminated response bodies. Per-phase size limits defend against
//! adversarial peers.
//!
//! # Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use strand_http::{Content, ParserConfig, RequestParser};
//!
//! let mut parser = RequestParser::new(ParserConfig::default());
//! let mut input = Bytes::from(socket_read);
//!
//! parser.parse_request_line(&mut sink, &mut input)?;
//! parser.parse_headers(&mut sink, &mut input)?;
//! while let Content::Data(slice) = parser.parse_content(&mut sink, &mut input)? {
//!     handle_body(slice); // aliases `input`, no copy
//! }
//! ```

#![deny(unsafe_code)]
// Pedantic clippy lints allowed (style suggestions, not correctness issues)
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::single_match_else)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod parser;
mod request;
mod response;
mod scan;
mod tokens;

pub use config::{
    DEFAULT_HEADER_SIZE_LIMIT, DEFAULT_INITIAL_BUFFER_SIZE, DEFAULT_MAX_CHUNK_SIZE,
    DEFAULT_MAX_REQUEST_LINE_SIZE, ParserConfig,
};
pub use parser::{BodyFraming, Content, MessageParser};
pub use request::RequestParser;
pub use response::{ResponseParser, status_implies_no_body};

// Re-export the sink traits and shared types so callers need only this crate.
pub use strand_core::{HeaderSink, HttpVersion, ParseError, RequestSink, ResponseSink};
