//! Error types for BIPF encoding and navigation.

use crate::codec::tag::Type;

/// Errors that can occur while encoding or navigating BIPF data.
#[derive(Debug, thiserror::Error)]
pub enum BipfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated varint")]
    Truncated,

    #[error("varint overflows 64 bits")]
    VarintOverflow,

    #[error("invalid type code: {0}")]
    InvalidType(u8),

    #[error("unexpected type {actual}, wanted {expected}")]
    TypeMismatch { expected: Type, actual: Type },

    #[error("{ty}: expected {expected} bytes of value, not {actual}")]
    LengthMismatch {
        ty: Type,
        expected: &'static str,
        actual: u64,
    },

    #[error("unexpected bool value: 0x{0:02X}")]
    MalformedBool(u8),

    #[error("invalid UTF-8 string")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    #[error("value ends at offset {end}, past its scope boundary at {boundary}")]
    OutOfScope { end: u64, boundary: u64 },

    #[error("no value left in the current scope")]
    Exhausted,

    #[error("operation out of sequence: {0}")]
    Sequence(&'static str),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(u64),

    #[error("nesting depth limit of {0} exceeded")]
    DepthLimit(usize),

    #[error("{what} of {len} bytes exceeds the limit of {limit}")]
    LimitExceeded {
        what: &'static str,
        len: u64,
        limit: u64,
    },

    #[error("label not found: {0:?}")]
    LabelNotFound(String),

    #[error("construction error: {0}")]
    Construction(String),

    #[error("{context}: {source}")]
    Encode {
        context: String,
        #[source]
        source: Box<BipfError>,
    },
}

impl BipfError {
    /// Wraps an inner encoding failure with the field or index it happened at.
    pub fn encode(context: impl Into<String>, source: BipfError) -> Self {
        Self::Encode {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Returns `true` for failures of the underlying byte source or sink,
    /// as opposed to malformed data.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Encode { source, .. } => source.is_io(),
            _ => false,
        }
    }
}
