use serde::{Deserialize, Serialize};

use crate::consts::LOCATION_SUFFIX;

/// Country and location triple of a relay, e.g. `KR - Korea Republic of ~ Seoul`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Short country code
    pub short: String,
    pub country: String,
    /// Location name with the decorative suffix already appended
    pub name: String,
}
impl Location {
    /// Appends the decorative suffix to `name`.
    pub fn new(short: impl Into<String>, country: impl Into<String>, name: impl AsRef<str>) -> Self {
        Self {
            short: short.into(),
            country: country.into(),
            name: format!("{}{}", name.as_ref(), LOCATION_SUFFIX),
        }
    }
}
