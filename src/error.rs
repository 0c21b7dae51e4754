//! Level error types.

use std::io;

use thiserror::Error;

/// Everything that can go wrong while building, reading or writing a level.
#[derive(Debug, Error)]
pub enum LevelError {
    /// `width + 1` would be a negative (or unrepresentable) column count.
    #[error("invalid width {0}: column count would be negative")]
    InvalidWidth(i32),

    /// Append target lies outside the current columns.
    #[error("column {x} is outside the store ({columns} columns)")]
    ColumnOutOfRange { x: i32, columns: usize },

    /// Unknown object discriminant in the stream.
    #[error("unsupported object variant tag {0}")]
    UnsupportedVariant(i32),

    /// Version tag no reader knows about.
    #[error("unsupported level format version {0}")]
    UnsupportedVersion(i32),

    /// Malformed field, count or string.
    #[error("malformed level data ({context}): {source}")]
    Deserialization {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// Level is too large to be read back under the given decode limits.
    #[error("{what} {count} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        count: usize,
        limit: usize,
    },

    /// Reload requested on a level that was never loaded or saved.
    #[error("level '{0}' has no backing file")]
    NoBackingFile(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl LevelError {
    /// Wrap a read failure that happened while decoding `context`.
    pub(crate) fn malformed(context: &'static str, source: io::Error) -> Self {
        LevelError::Deserialization { context, source }
    }

    /// Build a `Deserialization` error from a plain message.
    pub(crate) fn invalid(context: &'static str, msg: String) -> Self {
        LevelError::Deserialization {
            context,
            source: io::Error::new(io::ErrorKind::InvalidData, msg),
        }
    }
}

/// Result type for level operations.
pub type LevelResult<T> = Result<T, LevelError>;
