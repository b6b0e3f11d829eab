//! Error types surfaced by the fallible entry points of the crate
//!
//! Set algebra and trie traversal are total.  Errors come from decoding, range construction, pattern
//! rewriting and loading configuration.  Cursor movement reports failure through `bool` results instead.

use thiserror::Error;

/// Result type used by the fallible operations in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for everything the crate can report
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed serialized input
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid parameters passed to a constructor
    #[error("argument error: {0}")]
    Argument(#[from] ArgumentError),

    /// Failure in the pattern-rewriting capability
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// A config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons the canonical tree encoding can be rejected
///
/// Offsets are byte positions in the input where the problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid terminal flag {flag:#04x} at offset {offset}")]
    InvalidTerminalFlag { offset: usize, flag: u8 },

    #[error("varint at offset {offset} does not fit in 64 bits")]
    VarintOverflow { offset: usize },

    #[error("node at offset {offset} declares {count} children, at most 256 are possible")]
    TooManyChildren { offset: usize, count: u64 },

    #[error("zero-length edge at offset {offset}")]
    EmptyEdge { offset: usize },

    #[error("edge at offset {offset} is not in strictly ascending first-byte order")]
    UnsortedChildren { offset: usize },

    #[error("node at offset {offset} is not in canonical form")]
    NonCanonical { offset: usize },

    #[error("{remaining} trailing bytes after the root node at offset {offset}")]
    TrailingBytes { offset: usize, remaining: usize },

    #[error("nesting deeper than the configured limit of {limit} nodes")]
    DepthLimitExceeded { limit: usize },
}

/// Invalid arguments to a set constructor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("range step must be greater than zero")]
    ZeroStep,
}

/// Failures of the pattern-rewriting capability
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
