//! Harvests public VPN relay endpoints into a small set of JSON documents:
//! a deduplicated registry, one snapshot per day and a summary index of the
//! snapshots.

pub mod error;
pub mod fetch;
mod pipeline;

use std::sync::Arc;

use exn::ResultExt;
use vpngate_config::Config;
use vpngate_library::DataStore;
use vpngate_storage::backend::LocalBackend;

pub use crate::pipeline::{RunOptions, RunReport, regenerate_summaries, run};

use crate::error::{ErrorKind, Result};

/// Opens the data directory named by the configuration, creating it if needed.
pub fn open_store(config: &Config) -> Result<DataStore> {
    let backend = LocalBackend::new("data", &config.storage.data_dir).or_raise(|| ErrorKind::Storage)?;
    Ok(DataStore::new(
        Arc::new(backend),
        &config.storage.registry_file,
        &config.storage.summary_file,
    ))
}
