//! Extraction of a single relay entry.

use exn::{OptionExt, ResultExt};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::consts;
use crate::error::{Error, ErrorKind, PORT_EXPECTATION, Result};
use crate::models::{HostRecord, Location};
use crate::truncate::{LOG_PREVIEW_CHARS, truncate_for_log};

/// Extracts a [`HostRecord`] from one line of the relay listing.
///
/// Every pattern searches the whole line independently and the first match
/// wins; the listing is not tabular, so each entry is expected to contain
/// exactly one relevant address and one `hostname:port` pair.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    line: &'a str,
}
impl<'a> Extractor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line }
    }

    /// Returns `true` if the line carries the gateway marker. Most lines in a
    /// listing don't.
    pub fn is_entry(&self) -> bool {
        self.line.contains(consts::MARKER)
    }

    /// Extracts the full record.
    ///
    /// Rejections other than [`NotAnEntry`](ErrorKind::NotAnEntry) are logged
    /// as a warning, one per rejected line.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The line is not a gateway entry
    /// - The sessions info, IPv4 address or `hostname:port` pair is missing
    /// - The port does not fit in a `u16`
    #[instrument(level = "trace", skip_all, fields(line_size = self.line.len()))]
    pub fn record(self) -> Result<HostRecord> {
        let record = self.try_record();
        if let Err(err) = &record {
            let kind: &ErrorKind = err;
            if kind.is_loggable() {
                warn!(reason = %kind, entry = %truncate_for_log(self.line, LOG_PREVIEW_CHARS), "rejected relay entry");
            }
        }
        record
    }

    fn try_record(&self) -> Result<HostRecord> {
        if !self.is_entry() {
            exn::bail!(ErrorKind::NotAnEntry);
        }
        let session_info = self.session_info().ok_or_raise(|| ErrorKind::MissingField("sessions"))?;
        let region_info = self.region_info();
        let ip = self.ip().ok_or_raise(|| ErrorKind::MissingField("ip"))?;
        let (hostname, port) = self.host_port()?;
        Ok(HostRecord {
            id: Uuid::new_v4(),
            session_info: session_info.to_string(),
            region_info: region_info.map(str::to_string),
            ip: ip.to_string(),
            hostname: hostname.to_string(),
            port,
            key: HostRecord::endpoint_key(ip, port),
            location: self.location(),
        })
    }

    /// `"<digits> SESSIONS ..."` up to (not including) the first bullet.
    pub fn session_info(&self) -> Option<&'a str> {
        consts::SESSIONS_REGEX.captures(self.line).map(|captures| captures.extract::<1>().1[0])
    }

    /// `"<word> <number.number>"` directly followed by a bullet.
    pub fn region_info(&self) -> Option<&'a str> {
        consts::REGION_REGEX.captures(self.line).map(|captures| captures.extract::<1>().1[0])
    }

    pub fn ip(&self) -> Option<&'a str> {
        consts::IPV4_REGEX.find(self.line).map(|m| m.as_str())
    }

    /// The first `hostname:port` pair; the port must be plain base-10 digits
    /// that fit in a `u16`.
    pub fn host_port(&self) -> Result<(&'a str, u16)> {
        let captures =
            consts::HOST_PORT_REGEX.captures(self.line).ok_or_raise(|| ErrorKind::MissingField("hostname:port"))?;
        let (_, [hostname, port]) = captures.extract();
        // `\d` is Unicode-aware, so non-ASCII digits reach this point and are rejected here.
        let port = port.parse::<u16>().or_raise(|| ErrorKind::ParseError {
            field: "port",
            value: port.to_string(),
            expected: PORT_EXPECTATION,
        })?;
        Ok((hostname, port))
    }

    /// `"<short> - <country> ~ <name>"`, with the decorative suffix appended to the name.
    pub fn location(&self) -> Option<Location> {
        consts::LOCATION_REGEX.captures(self.line).map(|captures| {
            let (_, [short, country, name]) = captures.extract();
            Location::new(short, country, name)
        })
    }
}
impl<'a> From<&'a str> for Extractor<'a> {
    fn from(line: &'a str) -> Self {
        Self::new(line)
    }
}

impl<'a> TryFrom<Extractor<'a>> for HostRecord {
    type Error = Error;
    fn try_from(extractor: Extractor<'a>) -> Result<Self> {
        extractor.record()
    }
}

/// Easy entrypoint for extracting one [`HostRecord`] from one line.
///
/// # Examples
///
/// ```rust
/// use vpngate_extract::extract_record;
/// let record = extract_record("OPENGW 12 SESSIONS 3 days • 203.0.113.9 vpn1.example.org:1698").unwrap();
/// assert_eq!(record.key, "203.0.113.9:1698");
/// assert!(extract_record("a line without the marker").is_err());
/// ```
pub fn extract_record(line: &str) -> Result<HostRecord> {
    Extractor::new(line).record()
}
