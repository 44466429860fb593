//! Storage models.

use std::path::PathBuf;

/// File metadata returned by storage backends when listing the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// File name relative to the storage root
    pub path: PathBuf,
    /// File size in bytes, as stored on disk
    pub size: u64,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self { path: path.into(), size }
    }

    /// The file name as UTF-8, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}
