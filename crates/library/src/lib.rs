pub mod error;
mod json;
mod registry;
mod snapshot;
mod store;
mod summary;

pub use crate::registry::{RegistryUpdate, read_registry, update_registry};
pub use crate::snapshot::{SnapshotUpdate, read_snapshot, snapshot_name, update_snapshot};
pub use crate::store::DataStore;
pub use crate::summary::{FileSummary, build_summaries, is_snapshot_name, update_summaries};
