//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a failure while maintaining the data documents.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A storage backend operation (list, read, write) failed.
    #[display("storage operation failed")]
    Storage,
    /// A document exists but isn't the JSON array it should be.
    #[display("corrupt document: {}", _0.display())]
    Decode(#[error(not(source))] PathBuf),
    /// A document could not be serialized.
    #[display("could not encode document: {}", _0.display())]
    Encode(#[error(not(source))] PathBuf),
    /// The snapshot file name could not be rendered from the date.
    #[display("could not format snapshot name")]
    SnapshotName,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
