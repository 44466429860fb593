//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_path;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// In-memory storage backend for testing.
///
/// Files are stored in a map behind a [`RwLock`], so all trait methods can
/// operate on `&self`. Writes to paths registered with
/// [`failing_writes`](Self::failing_writes) fail with a permission error and
/// leave the stored content untouched, which is how tests simulate a disk
/// that refuses one document but not the others.
///
/// # Examples
///
/// ```
/// use vpngate_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = MockBackend::with_files([("db.json", "[]")]).failing_writes(["files.json"]);
/// assert_eq!(backend.read(Path::new("db.json")).unwrap(), b"[]");
/// assert!(backend.write(Path::new("files.json"), b"[]").is_err());
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    failing: HashSet<PathBuf>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            failing: HashSet::new(),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every write to the given paths fail.
    pub fn failing_writes(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.failing.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Current content of a file as UTF-8, for assertions.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let guard = self.storage.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(path.as_ref()).map(|data| String::from_utf8_lossy(data).into_owned())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<FileInfo>> {
        let guard = self.storage.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.iter().map(|(path, data)| FileInfo::new(path.clone(), data.len() as u64)).collect())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let guard = self.storage.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        if self.failing.contains(&path) {
            exn::bail!(ErrorKind::PermissionDenied(path));
        }
        let mut guard = self.storage.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(path, data.to_vec());
        Ok(())
    }
}
