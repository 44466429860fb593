mod batch;
mod consts;
pub mod error;
mod extract;
pub mod models;
mod truncate;

pub use crate::batch::{Batch, RawInput, Stats, parse, parse_value};
pub use crate::consts::{LOCATION_SUFFIX, MARKER};
pub use crate::extract::{Extractor, extract_record};
pub use crate::truncate::{LOG_PREVIEW_CHARS, truncate_for_log};
