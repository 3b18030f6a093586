//! Parser configuration.

/// Default capacity of the token accumulation buffer.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 4 * 1024;
/// Default ceiling for a header block (initial headers or trailers).
pub const DEFAULT_HEADER_SIZE_LIMIT: usize = 64 * 1024;
/// Default ceiling for a single chunk of a chunked body.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024 * 1024;
/// Default ceiling for a request line or status line.
pub const DEFAULT_MAX_REQUEST_LINE_SIZE: usize = 8 * 1024;

/// Size limits and buffer sizing for a parser instance.
///
/// Configuration is fixed at construction and survives `reset`. Every limit
/// guards a bounded phase of the parse, so an adversarial peer cannot force
/// unbounded buffering by withholding a delimiter.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    initial_buffer_size: usize,
    header_size_limit: usize,
    max_chunk_size: usize,
    max_request_line_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            header_size_limit: DEFAULT_HEADER_SIZE_LIMIT,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            max_request_line_size: DEFAULT_MAX_REQUEST_LINE_SIZE,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial capacity of the accumulation buffer.
    #[must_use]
    pub fn with_initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size;
        self
    }

    /// Set the maximum size of a header block.
    #[must_use]
    pub fn with_header_size_limit(mut self, limit: usize) -> Self {
        self.header_size_limit = limit;
        self
    }

    /// Set the maximum size of a single body chunk.
    #[must_use]
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Set the maximum size of a request line or status line.
    #[must_use]
    pub fn with_max_request_line_size(mut self, size: usize) -> Self {
        self.max_request_line_size = size;
        self
    }

    /// Returns the initial accumulation-buffer capacity.
    #[must_use]
    pub fn initial_buffer_size(&self) -> usize {
        self.initial_buffer_size
    }

    /// Returns the header block ceiling.
    #[must_use]
    pub fn header_size_limit(&self) -> usize {
        self.header_size_limit
    }

    /// Returns the single-chunk ceiling.
    #[must_use]
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Returns the request/status line ceiling.
    #[must_use]
    pub fn max_request_line_size(&self) -> usize {
        self.max_request_line_size
    }
}
