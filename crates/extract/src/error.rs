//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Accepted form of a port, for rejection messages.
pub const PORT_EXPECTATION: &str = "ASCII digits in 0-65535";

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The line does not carry the gateway marker; it is not a relay entry at all.
    #[display("not a relay entry")]
    NotAnEntry,
    /// A required field could not be found in the entry.
    #[display("missing required field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A field was found but could not be parsed.
    #[display("failed to parse field '{field}', found value: {value} (expected {expected})")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// The offending text.
        value: String,
        /// What the field accepts.
        expected: &'static str,
    },
    /// The batch input was neither a text blob nor a sequence of lines.
    #[display("invalid input kind: expected text or a list of lines, found {_0}")]
    InvalidInputKind(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if the rejection is worth a log line. Lines without the
    /// gateway marker are the common case and are skipped silently.
    pub fn is_loggable(&self) -> bool {
        !matches!(self, Self::NotAnEntry)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The same text always produces the same outcome.
        false
    }
}
