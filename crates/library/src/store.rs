use std::path::{Path, PathBuf};

use time::Date;
use vpngate_extract::models::HostRecord;
use vpngate_storage::{BackendHandle, StorageBackend};

use crate::error::Result;
use crate::registry::{self, RegistryUpdate};
use crate::snapshot::{self, SnapshotUpdate};
use crate::summary::{self, FileSummary};

/// The three documents of a data directory, bound to one backend.
///
/// Each operation reads, modifies and writes its own document and nothing
/// else, so a failure in one never prevents the others from running.
#[derive(Clone)]
pub struct DataStore {
    backend: BackendHandle,
    registry: PathBuf,
    summary: PathBuf,
}
impl DataStore {
    pub fn new(backend: BackendHandle, registry: impl Into<PathBuf>, summary: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            registry: registry.into(),
            summary: summary.into(),
        }
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary
    }

    pub fn update_registry(&self, records: &[HostRecord]) -> Result<RegistryUpdate> {
        registry::update_registry(self.backend(), &self.registry, records)
    }

    pub fn update_snapshot(&self, date: Date, records: &[HostRecord]) -> Result<SnapshotUpdate> {
        snapshot::update_snapshot(self.backend(), date, records)
    }

    pub fn update_summaries(&self) -> Result<Vec<FileSummary>> {
        summary::update_summaries(self.backend(), &self.summary)
    }

    pub fn read_snapshot(&self, date: Date) -> Result<Vec<HostRecord>> {
        snapshot::read_snapshot(self.backend(), date)
    }
}
