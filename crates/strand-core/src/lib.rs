//! Core types for the strand HTTP/1.x parser.
//!
//! This crate provides the building blocks shared by every parser in the
//! workspace:
//!
//! - [`ParseError`] - the two-kind error taxonomy (peer vs. programmer)
//! - [`HttpVersion`] - the known protocol version tokens
//! - [`HeaderSink`], [`RequestSink`], [`ResponseSink`] - the callback
//!   interfaces through which parsed elements reach the caller
//!
//! # Design Principles
//!
//! - No I/O and no allocation beyond what the emitted strings require
//! - All types are `Send + Sync`
//! - Callers own policy; the parser owns framing

#![forbid(unsafe_code)]
#![allow(clippy::must_use_candidate)]

mod error;
mod sink;
mod version;

pub use error::ParseError;
pub use sink::{HeaderSink, RequestSink, ResponseSink};
pub use version::HttpVersion;
