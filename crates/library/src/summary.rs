//! Summary index of the snapshot files in the data directory.

use std::path::Path;
use std::sync::LazyLock;

use exn::ResultExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};
use vpngate_storage::StorageBackend;

use crate::error::{ErrorKind, Result};
use crate::json;

static SNAPSHOT_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\.json$").unwrap());

/// One snapshot file as described in the summary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    /// Number of records in the snapshot (`0` if it couldn't be read)
    #[serde(rename = "sstpCount")]
    pub record_count: usize,
    /// Size of the file on disk
    #[serde(rename = "byteSize")]
    pub byte_size: u64,
}

/// Returns `true` for `YYYY-MM-DD.json` names. The check is on shape only,
/// `9999-99-99.json` still counts.
pub fn is_snapshot_name(name: &str) -> bool {
    SNAPSHOT_NAME_REGEX.is_match(name)
}

/// Describes every snapshot file in the backend, in listing order.
///
/// # Errors
///
/// Returns an error if the backend cannot be listed. Individual unreadable
/// snapshots are logged and counted as holding no records.
#[instrument(skip_all, fields(backend = backend.name()))]
pub fn build_summaries(backend: &dyn StorageBackend) -> Result<Vec<FileSummary>> {
    let files = backend.list().or_raise(|| ErrorKind::Storage)?;
    let mut summaries = Vec::new();
    for file in files {
        let Some(name) = file.name().filter(|name| is_snapshot_name(name)) else {
            continue;
        };
        let record_count = match json::read_array::<Value>(backend, &file.path) {
            Ok(entries) => entries.len(),
            Err(err) => {
                error!(path = %file.path.display(), error = %err, "counting unreadable snapshot as empty");
                0
            },
        };
        summaries.push(FileSummary {
            name: name.to_string(),
            record_count,
            byte_size: file.size,
        });
    }
    Ok(summaries)
}

/// Rebuilds the summary index and overwrites `path` with it in full.
///
/// # Errors
///
/// Returns an error if the backend cannot be listed or the index cannot be written.
pub fn update_summaries(backend: &dyn StorageBackend, path: &Path) -> Result<Vec<FileSummary>> {
    let summaries = build_summaries(backend)?;
    json::write_pretty(backend, path, &summaries)?;
    info!(path = %path.display(), files = summaries.len(), "summary index updated");
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use vpngate_storage::backend::{LocalBackend, MockBackend};

    #[rstest]
    #[case("2024-01-01.json", true)]
    #[case("1999-12-31.json", true)]
    #[case("db.json", false)]
    #[case("files.json", false)]
    #[case("notes.txt", false)]
    #[case("2024-01-01.json.bak", false)]
    #[case("2024-1-01.json", false)]
    #[case("x2024-01-01.json", false)]
    #[case("2024-01-01.txt", false)]
    fn test_is_snapshot_name(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_snapshot_name(name), expected);
    }

    #[test]
    fn summarizes_only_snapshots() {
        let temp_dir = tempfile::tempdir().unwrap();
        let snapshot = temp_dir.path().join("2024-01-01.json");
        fs::write(&snapshot, r#"[{"ip": "1.1.1.1"}, {"ip": "2.2.2.2"}, {"ip": "3.3.3.3"}]"#).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "three records above").unwrap();
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        let summaries = build_summaries(&backend).unwrap();
        assert_eq!(
            summaries,
            vec![FileSummary {
                name: "2024-01-01.json".to_string(),
                record_count: 3,
                byte_size: fs::metadata(&snapshot).unwrap().len(),
            }]
        );
    }

    #[test]
    fn corrupt_snapshot_counts_zero() {
        let backend = MockBackend::with_files([("2024-01-01.json", "[1, 2"), ("2024-01-02.json", "{}")]);
        let summaries = build_summaries(&backend).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.record_count == 0));
        assert_eq!(summaries[0].byte_size, 5);
    }

    #[test]
    fn index_is_overwritten_with_established_field_names() {
        let backend = MockBackend::with_files([
            ("2024-01-01.json", "[1]"),
            ("db.json", "[\"1.2.3.4:443\"]"),
            ("files.json", "[{\"stale\": true}]"),
        ]);
        update_summaries(&backend, Path::new("files.json")).unwrap();
        let index: Value = serde_json::from_str(&backend.contents("files.json").unwrap()).unwrap();
        assert_eq!(index, serde_json::json!([{"name": "2024-01-01.json", "sstpCount": 1, "byteSize": 3}]));
    }
}
