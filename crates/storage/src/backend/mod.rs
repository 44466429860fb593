//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the seam between the
//! documents the harvester maintains and where they physically live.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileInfo;
use std::path::Path;

/// Unified interface for storage backends.
///
/// All operations are blocking; the harvester runs start to finish on one
/// thread and never holds more than one document in memory at a time.
///
/// # Path Handling
/// All paths are plain file names relative to the storage root and must be
/// validated using [`validate_path`](crate::validate_path) before use.
/// Implementations should enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vpngate_storage::{backend::StorageBackend, error::Result};
///
/// fn size_of_registry(backend: &dyn StorageBackend) -> Result<u64> {
///     match backend.read(Path::new("db.json")) {
///         Ok(data) => Ok(data.len() as u64),
///         Err(e) if e.is_not_found() => Ok(0),
///         Err(e) => Err(e),
///     }
/// }
/// ```
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// List the files directly inside the storage root, in whatever order
    /// the backend yields them. Directories are not descended into.
    fn list(&self) -> Result<Vec<FileInfo>>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, replacing any existing file.
    ///
    /// # Notes
    /// - Implementations must replace atomically: either the whole of `data`
    ///   becomes the file's content, or the previous content is left intact.
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
