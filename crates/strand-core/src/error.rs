//! Error taxonomy for the parser state machines.

/// HTTP parsing error.
///
/// Exactly two kinds exist. `BadRequest` is peer-attributable: the bytes on
/// the wire are not an acceptable HTTP/1.x message, and the connection must
/// be abandoned. `InvalidState` is programmer-attributable: an operation was
/// invoked in a terminal or otherwise impossible state.
///
/// Errors are never recovered inside the parser. Every failure forces the
/// state machine into its terminal state before the error surfaces, so a
/// parser that has returned `Err` accepts no further input until `reset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Malformed or abusive input from the peer. Carries the reason.
    BadRequest(String),
    /// An operation was called when the state machine cannot honor it.
    InvalidState(&'static str),
}

impl ParseError {
    /// Returns true if the error is attributable to the peer.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(reason) => write!(f, "bad request: {reason}"),
            Self::InvalidState(detail) => write!(f, "invalid parser state: {detail}"),
        }
    }
}

impl std::error::Error for ParseError {}
