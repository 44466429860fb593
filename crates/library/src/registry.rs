//! The cross-run registry of relay endpoints: a JSON array of `"ip:port"`
//! strings with set semantics.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;
use tracing::{error, info, instrument};
use vpngate_extract::models::HostRecord;
use vpngate_storage::StorageBackend;

use crate::error::Result;
use crate::json;

/// Outcome of merging one batch into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryUpdate {
    /// Entries loaded from the existing document
    pub previous: usize,
    /// Entries that were not in the registry before
    pub added: usize,
    /// Entries written back
    pub total: usize,
}

/// Reads the registry. A missing or corrupt document is an empty registry;
/// entries that aren't strings are logged and dropped, the rest are kept.
pub fn read_registry(backend: &dyn StorageBackend, path: &Path) -> BTreeSet<String> {
    json::read_array_or_empty::<Value>(backend, path)
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(key) => Some(key),
            other => {
                error!(path = %path.display(), entry = %other, "registry entry is not a string, skipping");
                None
            },
        })
        .collect()
}

/// Merges the endpoints of `records` into the registry and writes it back.
///
/// The merge is a set union, so applying the same records again changes
/// nothing. Entries are written in sorted order; order carries no meaning.
///
/// # Errors
///
/// Returns an error if the merged registry cannot be written. The existing
/// document is left untouched in that case.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn update_registry(backend: &dyn StorageBackend, path: &Path, records: &[HostRecord]) -> Result<RegistryUpdate> {
    let mut registry = read_registry(backend, path);
    let previous = registry.len();
    for record in records {
        match record.registry_key() {
            Some(key) => {
                registry.insert(key);
            },
            None => error!(id = %record.id, hostname = %record.hostname, "record has no address, skipping"),
        }
    }
    let entries: Vec<&String> = registry.iter().collect();
    json::write_pretty(backend, path, &entries)?;
    let update = RegistryUpdate {
        previous,
        added: registry.len() - previous,
        total: registry.len(),
    };
    info!(added = update.added, total = update.total, "registry updated");
    Ok(update)
}
