//! Known HTTP/1.x protocol version tokens.

/// Protocol version token from a request line or status line.
///
/// Only the four tokens that appear on the wire for HTTP/1.x are recognized;
/// anything else fails the line parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVersion {
    /// `HTTP/1.0`
    Http10,
    /// `HTTP/1.1`
    Http11,
    /// `HTTPS/1.0`
    Https10,
    /// `HTTPS/1.1`
    Https11,
}

impl HttpVersion {
    /// Match a raw version token, e.g. `b"HTTP/1.1"`.
    #[must_use]
    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"HTTP/1.0" => Some(Self::Http10),
            b"HTTP/1.1" => Some(Self::Http11),
            b"HTTPS/1.0" => Some(Self::Https10),
            b"HTTPS/1.1" => Some(Self::Https11),
            _ => None,
        }
    }

    /// The wire form of the token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
            Self::Https10 => "HTTPS/1.0",
            Self::Https11 => "HTTPS/1.1",
        }
    }

    /// True for the `HTTPS/x.x` tokens.
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Https10 | Self::Https11)
    }

    /// Major protocol version. Always 1 for the known tokens.
    #[inline]
    #[must_use]
    pub fn major(&self) -> u8 {
        1
    }

    /// Minor protocol version.
    #[inline]
    #[must_use]
    pub fn minor(&self) -> u8 {
        match self {
            Self::Http10 | Self::Https10 => 0,
            Self::Http11 | Self::Https11 => 1,
        }
    }
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
