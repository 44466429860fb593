use crate::error::{ErrorKind, Result};
use crate::models::HostRecord;

/// Counters accumulated while parsing one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Entries produced by the split (or given as-is)
    pub entries: usize,
    /// Entries that produced a record
    pub accepted: usize,
    /// Gateway entries that were rejected (and logged)
    pub rejected: usize,
    /// Lines without the gateway marker
    pub skipped: usize,
}
impl Stats {
    pub(crate) fn tally(&mut self, outcome: &Result<HostRecord>) {
        match outcome {
            Ok(_) => self.accepted += 1,
            Err(err) if **err == ErrorKind::NotAnEntry => self.skipped += 1,
            Err(_) => self.rejected += 1,
        }
    }
}
