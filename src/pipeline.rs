//! One harvest run: retrieve, parse, then maintain each document in turn.

use exn::ResultExt;
use tracing::{error, info, instrument, warn};
use vpngate_config::Settings;
use vpngate_extract::{LOG_PREVIEW_CHARS, Stats, truncate_for_log};
use vpngate_library::{DataStore, RegistryUpdate, SnapshotUpdate};

use crate::error::{ErrorKind, Result};
use crate::fetch::Retrieve;

/// What one run did. A stage left as `None` either failed (and was logged)
/// or was skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stats: Stats,
    pub registry: Option<RegistryUpdate>,
    pub snapshot: Option<SnapshotUpdate>,
    /// Number of snapshot files described in the summary index
    pub summaries: Option<usize>,
}
impl RunReport {
    /// Returns `true` if every persistence stage completed.
    pub fn is_complete(&self) -> bool {
        self.registry.is_some() && self.snapshot.is_some() && self.summaries.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Parse and report only; touch no document.
    pub dry_run: bool,
}

/// Runs the whole harvest.
///
/// The registry, snapshot and summary stages are independent: a failure in
/// one is logged and the next still runs. An empty parse result persists
/// nothing.
///
/// # Errors
///
/// Only a failed retrieval is an error; in that case no document is touched.
#[instrument(skip_all, fields(source = retriever.source(), today = %settings.today))]
pub fn run(settings: &Settings, retriever: &dyn Retrieve, store: &DataStore, options: RunOptions) -> Result<RunReport> {
    let listing = match retriever.retrieve() {
        Ok(listing) => listing,
        Err(err) => {
            let retryable = err.is_retryable();
            return Err(err).or_raise(|| ErrorKind::Retrieval {
                origin: truncate_for_log(retriever.source(), LOG_PREVIEW_CHARS),
                retryable,
            });
        },
    };
    let batch = vpngate_extract::parse(listing);
    let mut report = RunReport {
        stats: batch.stats,
        ..RunReport::default()
    };

    if batch.is_empty() {
        warn!(entries = batch.stats.entries, "no relay records in listing, nothing to persist");
        return Ok(report);
    }
    if options.dry_run {
        info!(accepted = batch.stats.accepted, "dry run, skipping persistence");
        return Ok(report);
    }

    report.registry = match store.update_registry(&batch.records) {
        Ok(update) => Some(update),
        Err(err) => {
            error!(path = %store.registry_path().display(), error = ?err, "could not update registry");
            None
        },
    };
    report.snapshot = match store.update_snapshot(settings.today, &batch.records) {
        Ok(update) => Some(update),
        Err(err) => {
            error!(date = %settings.today, error = ?err, "could not update daily snapshot");
            None
        },
    };
    report.summaries = regenerate_summaries(store);
    info!(complete = report.is_complete(), "harvest finished");
    Ok(report)
}

/// Rewrites the summary index from the snapshots currently in the store.
/// Returns the number of snapshots described, or `None` if it failed (logged).
pub fn regenerate_summaries(store: &DataStore) -> Option<usize> {
    match store.update_summaries() {
        Ok(summaries) => Some(summaries.len()),
        Err(err) => {
            error!(path = %store.summary_path().display(), error = ?err, "could not update summary index");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{self, Retrieve};
    use rstest::rstest;
    use std::sync::Arc;
    use time::macros::date;
    use vpngate_config::Config;
    use vpngate_storage::StorageBackend;
    use vpngate_storage::backend::{LocalBackend, MockBackend};

    const LISTING: &str = "\
VPN Gate relay list
OPENGW 5 SESSIONS bar • region 1.0• 1.2.3.4 host.example.com:443 JP - Japan ~ Tokyo
OPENGW 12 SESSIONS 3 days • 203.0.113.9 vpn1.example.org:1698
OPENGW no sessions 198.51.100.1 broken.example:1
";

    struct Stub(std::result::Result<String, fetch::ErrorKind>);
    impl Retrieve for Stub {
        fn source(&self) -> &str {
            "stub"
        }
        fn retrieve(&self) -> fetch::Result<String> {
            self.0.clone().map_err(exn::Exn::from)
        }
    }

    fn settings() -> Settings {
        Settings::new(Config::default(), date!(2024 - 01 - 01))
    }

    fn store(backend: MockBackend) -> (Arc<MockBackend>, DataStore) {
        let backend = Arc::new(backend);
        let store = DataStore::new(backend.clone(), "db.json", "files.json");
        (backend, store)
    }

    #[test]
    fn retrieval_failure_writes_nothing() {
        let (backend, store) = store(MockBackend::default());
        let retriever = Stub(Err(fetch::ErrorKind::Timeout("stub".to_string())));
        let err = run(&settings(), &retriever, &store, RunOptions::default()).unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::Retrieval {
                origin: "stub".to_string(),
                retryable: true,
            }
        );
        assert!(backend.list().unwrap().is_empty());
    }

    #[rstest]
    #[case(fetch::ErrorKind::Status { code: 404, preview: String::new() }, false)]
    #[case(fetch::ErrorKind::Status { code: 503, preview: String::new() }, true)]
    #[case(fetch::ErrorKind::Read("stdin".to_string()), false)]
    fn retrieval_retryability_follows_the_cause(#[case] cause: fetch::ErrorKind, #[case] expected: bool) {
        let (_, store) = store(MockBackend::default());
        let err = run(&settings(), &Stub(Err(cause)), &store, RunOptions::default()).unwrap_err();
        assert_eq!(err.is_retryable(), expected);
    }

    #[test]
    fn full_run_writes_every_document() {
        let (backend, store) = store(MockBackend::default());
        let report = run(&settings(), &Stub(Ok(LISTING.to_string())), &store, RunOptions::default()).unwrap();
        assert_eq!(report.stats.accepted, 2);
        assert_eq!(report.stats.rejected, 1);
        assert!(report.is_complete());
        assert_eq!(report.registry.unwrap().total, 2);
        assert_eq!(report.snapshot.unwrap().appended, 2);
        assert_eq!(report.summaries, Some(1));

        let registry: Vec<String> = serde_json::from_str(&backend.contents("db.json").unwrap()).unwrap();
        assert_eq!(registry, vec!["1.2.3.4:443", "203.0.113.9:1698"]);
        let summary: serde_json::Value = serde_json::from_str(&backend.contents("files.json").unwrap()).unwrap();
        assert_eq!(summary[0]["name"], "2024-01-01.json");
        assert_eq!(summary[0]["sstpCount"], 2);
    }

    #[test]
    fn failed_stage_does_not_stop_later_stages() {
        let (backend, store) = store(MockBackend::default().failing_writes(["db.json"]));
        let report = run(&settings(), &Stub(Ok(LISTING.to_string())), &store, RunOptions::default()).unwrap();
        assert_eq!(report.registry, None);
        assert!(report.snapshot.is_some());
        assert_eq!(report.summaries, Some(1));
        assert!(!report.is_complete());
        assert_eq!(backend.contents("db.json"), None);
        assert!(backend.contents("2024-01-01.json").is_some());
    }

    #[test]
    fn empty_listing_persists_nothing() {
        let (backend, store) = store(MockBackend::default());
        let report = run(&settings(), &Stub(Ok("nothing here\n".to_string())), &store, RunOptions::default()).unwrap();
        assert_eq!(report.stats.accepted, 0);
        assert_eq!(report.registry, None);
        assert!(backend.list().unwrap().is_empty());
    }

    #[test]
    fn dry_run_persists_nothing() {
        let (backend, store) = store(MockBackend::default());
        let options = RunOptions { dry_run: true };
        let report = run(&settings(), &Stub(Ok(LISTING.to_string())), &store, options).unwrap();
        assert_eq!(report.stats.accepted, 2);
        assert!(backend.list().unwrap().is_empty());
    }

    #[test]
    fn repeated_runs_duplicate_snapshot_but_not_registry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(LocalBackend::new("data", temp_dir.path()).unwrap());
        let store = DataStore::new(backend, "db.json", "files.json");
        let retriever = Stub(Ok(LISTING.to_string()));
        run(&settings(), &retriever, &store, RunOptions::default()).unwrap();
        let second = run(&settings(), &retriever, &store, RunOptions::default()).unwrap();
        assert_eq!(second.registry.unwrap().added, 0);
        assert_eq!(second.snapshot.unwrap().total, 4);
        assert_eq!(store.read_snapshot(date!(2024 - 01 - 01)).unwrap().len(), 4);
    }
}
