use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Location;

/// One VPN gateway endpoint parsed from a single listing entry.
///
/// The `id` is generated fresh on every parse, so the same physical relay gets
/// a different `id` each run. Identity across runs is [`key`](Self::key),
/// which is what the registry stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Random v4 identifier, no ordering significance
    pub id: Uuid,
    /// Session/load description, captured verbatim
    #[serde(rename = "info")]
    pub session_info: String,
    /// Region/speed tag, if the entry carried one
    #[serde(rename = "info2")]
    pub region_info: Option<String>,
    /// Dotted IPv4 address as written in the entry
    pub ip: String,
    pub hostname: String,
    pub port: u16,
    /// `"<ip>:<port>"`
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}
impl HostRecord {
    /// Builds the `"<ip>:<port>"` identity used by the registry.
    pub fn endpoint_key(ip: &str, port: u16) -> String {
        format!("{}:{}", ip, port)
    }

    /// The registry entry for this record, or `None` when the record has no
    /// address to key on (only possible for hand-built records).
    pub fn registry_key(&self) -> Option<String> {
        match self.ip.is_empty() {
            true => None,
            false => Some(Self::endpoint_key(&self.ip, self.port)),
        }
    }
}
impl Display for HostRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({}:{})", self.hostname, self.ip, self.port)
    }
}
