//! Batch parsing of a whole relay listing.

mod input;
mod stats;

pub use self::input::RawInput;
pub use self::stats::Stats;

use serde_json::Value;
use tracing::{error, info, instrument};

use crate::extract::Extractor;
use crate::models::HostRecord;

/// Records accepted from one listing, in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Batch {
    pub records: Vec<HostRecord>,
    pub stats: Stats,
}
impl Batch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
impl IntoIterator for Batch {
    type Item = HostRecord;
    type IntoIter = std::vec::IntoIter<HostRecord>;
    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Parses every entry of the listing, keeping the records that extract
/// cleanly. A rejected entry never aborts the batch.
///
/// # Examples
///
/// ```rust
/// use vpngate_extract::parse;
/// let batch = parse("header\nOPENGW 5 SESSIONS bar • 1.2.3.4 host.example.com:443\nfooter\n");
/// assert_eq!(batch.records.len(), 1);
/// assert_eq!(batch.stats.entries, 4);
/// assert_eq!(batch.stats.skipped, 3);
/// ```
#[instrument(skip_all, fields(entries, accepted))]
pub fn parse(input: impl Into<RawInput>) -> Batch {
    let input = input.into();
    let entries = input.entries();
    tracing::Span::current().record("entries", entries.len());
    info!(entries = entries.len(), "split listing into entries");
    let mut batch = Batch::default();
    batch.stats.entries = entries.len();
    for entry in entries {
        let outcome = Extractor::new(entry).record();
        batch.stats.tally(&outcome);
        if let Ok(record) = outcome {
            batch.records.push(record);
        }
    }
    tracing::Span::current().record("accepted", batch.stats.accepted);
    info!(
        accepted = batch.stats.accepted,
        rejected = batch.stats.rejected,
        skipped = batch.stats.skipped,
        "parsed relay listing"
    );
    batch
}

/// Parses a loosely-typed listing. Anything other than a string or an array
/// of strings is logged and yields an empty batch.
pub fn parse_value(value: Value) -> Batch {
    match RawInput::try_from(value) {
        Ok(input) => parse(input),
        Err(err) => {
            error!(error = %err, "cannot parse relay listing");
            Batch::default()
        },
    }
}
