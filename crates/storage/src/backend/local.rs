//! Local filesystem storage backend.
//!
//! Files are stored in a configured directory and accessed using blocking
//! `std::fs` operations. Writes go through a temporary file in the same
//! directory which is then persisted (renamed) over the target.

use crate::error::{ErrorKind, Result};
use crate::{FileInfo, StorageBackend, path::validate as validate_path};
use std::fs::{self, DirEntry};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use vpngate_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/var/lib/vpngate")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Data directory
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend, creating the root directory if
    /// it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but isn't a directory, or can't be created.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            fs::create_dir_all(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// A temporary file in the root with the mode a plain `fs::write` would
    /// give the target: the existing file's permissions when replacing, the
    /// umask default otherwise.
    fn temp_file_for(&self, target: &Path) -> Result<NamedTempFile> {
        #[cfg_attr(not(unix), allow(unused_mut))]
        let mut builder = Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let temp = builder.tempfile_in(&self.root).map_err(|e| Self::map_io_error(e, &self.root))?;
        if let Ok(metadata) = fs::metadata(target) {
            temp.as_file().set_permissions(metadata.permissions()).map_err(ErrorKind::Io)?;
        }
        Ok(temp)
    }

    fn process_entry(entry: DirEntry) -> Result<Option<FileInfo>> {
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| Self::map_io_error(e, &path))?;
        // Note: directories and what is most likely a broken symlink are dropped.
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some(FileInfo::new(entry.file_name(), metadata.len())))
    }
}

impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<FileInfo>> {
        let entries = fs::read_dir(&self.root).map_err(|e| Self::map_io_error(e, &self.root))?;
        let mut files = Vec::new();
        for entry in entries {
            let processed = entry.map_err(|e| Self::map_io_error(e, &self.root)).map_err(exn::Exn::from);
            match processed.and_then(Self::process_entry) {
                Ok(Some(info)) => files.push(info),
                Ok(None) => {},
                Err(e) => warn!(backend = %self.name, error = %e, "skipping unreadable directory entry"),
            }
        }
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).map_err(|e| Self::map_io_error(e, path))?)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        // The temporary file must live on the same filesystem as the target
        // for the final rename to be atomic.
        let mut temp = self.temp_file_for(&abs_path)?;
        temp.write_all(data).map_err(ErrorKind::Io)?;
        temp.as_file().sync_all().map_err(ErrorKind::Io)?;
        temp.persist(&abs_path).map_err(|e| Self::map_io_error(e.error, path))?;
        debug!(backend = %self.name, path = %path.display(), bytes = data.len(), "replaced file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("data");
        assert!(!root.exists());
        let backend = LocalBackend::new("name", &root).unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.root(), root.as_path());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("file");
        fs::write(&file, b"").unwrap();
        let err = LocalBackend::new("name", &file).err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        assert_eq!(backend.absolute_path("db.json").unwrap(), temp_dir.path().join("db.json"));
        assert!(backend.absolute_path("../etc/passwd").is_err());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("db.json"), b"[]").unwrap();
        assert_eq!(backend.read(Path::new("db.json")).unwrap(), b"[]");
        backend.write(Path::new("db.json"), b"[\"1.2.3.4:443\"]").unwrap();
        assert_eq!(backend.read(Path::new("db.json")).unwrap(), b"[\"1.2.3.4:443\"]");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_uses_default_mode_for_new_files() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("plain.json"), b"[]").unwrap();
        backend.write(Path::new("db.json"), b"[]").unwrap();
        let mode = |name: &str| fs::metadata(temp_dir.path().join(name)).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode("db.json"), mode("plain.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let target = temp_dir.path().join("files.json");
        fs::write(&target, b"[]").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o640)).unwrap();
        backend.write(Path::new("files.json"), b"[1]").unwrap();
        assert_eq!(fs::metadata(&target).unwrap().permissions().mode() & 0o777, 0o640);
        assert_eq!(fs::read(&target).unwrap(), b"[1]");
    }

    #[test]
    fn test_write_leaves_no_temporary_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        backend.write(Path::new("db.json"), b"[]").unwrap();
        backend.write(Path::new("db.json"), b"[1]").unwrap();
        let files = backend.list().unwrap();
        assert_eq!(files, vec![FileInfo::new("db.json", 3)]);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        let err = backend.read(Path::new("missing.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_skips_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path()).unwrap();
        fs::create_dir(temp_dir.path().join("2024-01-02.json")).unwrap();
        fs::write(temp_dir.path().join("2024-01-01.json"), b"[1, 2]").unwrap();
        let files = backend.list().unwrap();
        assert_eq!(files, vec![FileInfo::new("2024-01-01.json", 6)]);
    }
}
