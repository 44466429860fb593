//! Whole-document JSON reads and writes on top of a storage backend.

use std::path::Path;

use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;
use tracing::error;
use vpngate_storage::StorageBackend;

use crate::error::{ErrorKind, Result};

/// Documents are indented with four spaces, matching the files already out in the wild.
const INDENT: &[u8] = b"    ";

/// Reads a JSON array document.
///
/// # Errors
///
/// Returns [`Storage`](ErrorKind::Storage) if the file can't be read (including
/// when it doesn't exist) and [`Decode`](ErrorKind::Decode) if it isn't an array of `T`.
pub(crate) fn read_array<T: DeserializeOwned>(backend: &dyn StorageBackend, path: &Path) -> Result<Vec<T>> {
    let data = backend.read(path).or_raise(|| ErrorKind::Storage)?;
    serde_json::from_slice(&data).or_raise(|| ErrorKind::Decode(path.to_path_buf()))
}

/// Reads a JSON array document, substituting an empty baseline for a missing,
/// unreadable or corrupt file. The condition is logged, never returned.
pub(crate) fn read_array_or_empty<T: DeserializeOwned>(backend: &dyn StorageBackend, path: &Path) -> Vec<T> {
    match read_array(backend, path) {
        Ok(items) => items,
        Err(err) => {
            error!(backend = backend.name(), path = %path.display(), error = %err, "using empty baseline");
            Vec::new()
        },
    }
}

/// Serializes the whole document first, then hands it to the backend in one
/// write so a failure never leaves a half-written file behind.
pub(crate) fn write_pretty<T: Serialize + ?Sized>(backend: &dyn StorageBackend, path: &Path, value: &T) -> Result<u64> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer).or_raise(|| ErrorKind::Encode(path.to_path_buf()))?;
    backend.write(path, &buffer).or_raise(|| ErrorKind::Storage)?;
    Ok(buffer.len() as u64)
}
