//! Per-day snapshots: every record parsed on a given day, appended run after run.

use std::path::PathBuf;

use exn::ResultExt;
use serde_json::Value;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{info, instrument};
use vpngate_extract::models::HostRecord;
use vpngate_storage::StorageBackend;

use crate::error::{ErrorKind, Result};
use crate::json;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Outcome of appending one batch to a day's snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotUpdate {
    /// Entries already in the snapshot
    pub previous: usize,
    pub appended: usize,
    pub total: usize,
}

/// The snapshot file name for a date, e.g. `2024-01-01.json`.
pub fn snapshot_name(date: Date) -> Result<PathBuf> {
    let stem = date.format(DATE_FORMAT).or_raise(|| ErrorKind::SnapshotName)?;
    Ok(PathBuf::from(format!("{}.json", stem)))
}

/// Appends `records` to the snapshot of `date` and writes it back.
///
/// Records are **not** deduplicated against the snapshot: running twice on
/// the same day stores every record twice. Entries already in the file are
/// carried over as raw JSON, whatever their shape.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be written. A missing or corrupt
/// snapshot is not an error; it is logged and replaced.
#[instrument(skip_all, fields(date = %date, records = records.len()))]
pub fn update_snapshot(backend: &dyn StorageBackend, date: Date, records: &[HostRecord]) -> Result<SnapshotUpdate> {
    let path = snapshot_name(date)?;
    let mut entries: Vec<Value> = json::read_array_or_empty(backend, &path);
    let previous = entries.len();
    for record in records {
        entries.push(serde_json::to_value(record).or_raise(|| ErrorKind::Encode(path.clone()))?);
    }
    json::write_pretty(backend, &path, &entries)?;
    let update = SnapshotUpdate {
        previous,
        appended: records.len(),
        total: entries.len(),
    };
    info!(path = %path.display(), appended = update.appended, total = update.total, "snapshot updated");
    Ok(update)
}

/// Reads the full records of a day's snapshot.
///
/// # Errors
///
/// Unlike [`update_snapshot`], a missing or corrupt file is an error here.
pub fn read_snapshot(backend: &dyn StorageBackend, date: Date) -> Result<Vec<HostRecord>> {
    json::read_array(backend, &snapshot_name(date)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use vpngate_extract::parse;
    use vpngate_storage::backend::{LocalBackend, MockBackend};

    const LISTING: &str = "\
OPENGW 5 SESSIONS bar • region 1.0• 1.2.3.4 host.example.com:443 JP - Japan ~ Tokyo
OPENGW 6 SESSIONS baz • 5.6.7.8 other.example.com:1194
";

    #[test]
    fn names_follow_the_date() {
        assert_eq!(snapshot_name(date!(2024 - 01 - 01)).unwrap(), PathBuf::from("2024-01-01.json"));
        assert_eq!(snapshot_name(date!(2031 - 11 - 30)).unwrap(), PathBuf::from("2031-11-30.json"));
    }

    #[test]
    fn round_trip_preserves_content_and_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        let records = parse(LISTING).records;
        update_snapshot(&backend, date!(2024 - 01 - 01), &records).unwrap();
        assert_eq!(read_snapshot(&backend, date!(2024 - 01 - 01)).unwrap(), records);
    }

    #[test]
    fn repeated_runs_duplicate_entries() {
        let backend = MockBackend::default();
        let records = parse(LISTING).records;
        let first = update_snapshot(&backend, date!(2024 - 01 - 01), &records).unwrap();
        let second = update_snapshot(&backend, date!(2024 - 01 - 01), &records).unwrap();
        assert_eq!(first, SnapshotUpdate { previous: 0, appended: 2, total: 2 });
        assert_eq!(second, SnapshotUpdate { previous: 2, appended: 2, total: 4 });
        let stored = read_snapshot(&backend, date!(2024 - 01 - 01)).unwrap();
        assert_eq!(stored[0], stored[2]);
        assert_eq!(stored[1], stored[3]);
    }

    #[test]
    fn days_are_kept_apart() {
        let backend = MockBackend::default();
        let records = parse(LISTING).records;
        update_snapshot(&backend, date!(2024 - 01 - 01), &records).unwrap();
        update_snapshot(&backend, date!(2024 - 01 - 02), &records[..1]).unwrap();
        assert_eq!(read_snapshot(&backend, date!(2024 - 01 - 01)).unwrap().len(), 2);
        assert_eq!(read_snapshot(&backend, date!(2024 - 01 - 02)).unwrap().len(), 1);
    }

    #[test]
    fn foreign_entries_survive_an_append() {
        let backend = MockBackend::with_files([("2024-01-01.json", r#"[{"legacy": true}]"#)]);
        let records = parse(LISTING).records;
        let update = update_snapshot(&backend, date!(2024 - 01 - 01), &records).unwrap();
        assert_eq!(update.total, 3);
        let stored: Vec<Value> = serde_json::from_str(&backend.contents("2024-01-01.json").unwrap()).unwrap();
        assert_eq!(stored[0], serde_json::json!({"legacy": true}));
    }

    #[test]
    fn corrupt_snapshot_is_replaced() {
        let backend = MockBackend::with_files([("2024-01-01.json", "[{")]);
        let records = parse(LISTING).records;
        let update = update_snapshot(&backend, date!(2024 - 01 - 01), &records).unwrap();
        assert_eq!(update.previous, 0);
        assert_eq!(read_snapshot(&backend, date!(2024 - 01 - 01)).unwrap(), records);
    }
}
