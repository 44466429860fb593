//! Harvester Error Types

use derive_more::{Display, Error};

/// A run error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for harvester runs.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that end a run before anything is persisted.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not retrieve relay listing from {origin}")]
    Retrieval {
        origin: String,
        /// Taken from the underlying retrieval failure
        retryable: bool,
    },
    #[display("could not load configuration")]
    Config,
    #[display("could not open data directory")]
    Storage,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retrieval { retryable: true, .. })
    }
}
