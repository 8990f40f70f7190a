//! Decoder configuration.

use std::fmt;
use std::io::Write;

/// Default nesting limit for entered composites.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Limits and tracing for a [`Decoder`](super::Decoder).
pub struct DecoderConfig {
    pub(crate) max_depth: usize,
    pub(crate) max_string_len: Option<u64>,
    pub(crate) trace: Option<Box<dyn Write + Send>>,
}

impl DecoderConfig {
    /// Starts from the defaults: depth 512, no string limit, no trace sink.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the maximum number of nested scopes the decoder will enter.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Caps the payload size `read_string` and `read_buffer` will copy out.
    pub fn max_string_len(mut self, limit: u64) -> Self {
        self.max_string_len = Some(limit);
        self
    }

    /// Sets a sink that receives one line per decoded tag.
    ///
    /// Write failures on the sink are ignored.
    pub fn trace_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.trace = Some(Box::new(sink));
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_string_len: None,
            trace: None,
        }
    }
}

impl fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("max_depth", &self.max_depth)
            .field("max_string_len", &self.max_string_len)
            .field("trace", &self.trace.is_some())
            .finish()
    }
}
