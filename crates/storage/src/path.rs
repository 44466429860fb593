//! Path validation for the flat data directory.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path. The data directory is flat, so a valid path is
/// exactly one plain file name (`./` prefixes are tolerated and stripped).
///
/// > **Note:** Null bytes are explicitly rejected; they pass through
/// >           `Path::components()` on Unix but truncate C-based syscalls.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vpngate_storage::validate_path;
/// assert_eq!(validate_path("./db.json").unwrap(), Path::new("db.json"));
/// assert!(validate_path("2024-01-01.json").is_ok());
/// assert!(validate_path("../db.json").is_err());
/// assert!(validate_path("nested/db.json").is_err());
/// assert!(validate_path("").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut name = None;
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::Normal(s) if name.is_none() && !s.as_encoded_bytes().contains(&0) => name = Some(s),
            _ => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        }
    }
    match name {
        Some(name) => Ok(PathBuf::from(name)),
        None => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}
