use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Substring identifying a line as a gateway entry.
pub const MARKER: &str = "OPENGW";
/// Appended to every matched location name.
pub const LOCATION_SUFFIX: &str = " ★VPNGATE★";

regex!(NEWLINES_REGEX, r"\n+");
// Non-greedy up to the first bullet, the bullet itself is not captured.
regex!(SESSIONS_REGEX, r"(\d+\sSESSIONS.*?)•");
regex!(REGION_REGEX, r"(\w+\s\d+\.\d+)•");
regex!(IPV4_REGEX, r"[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+");
regex!(HOST_PORT_REGEX, r"([a-zA-Z0-9.-]+):(\d+)");
regex!(LOCATION_REGEX, r"(\w+)\s-\s([\w\s]+)\s~\s([\w\s]+)");
