//! Shortening of arbitrary text before it ends up in a log line.

/// Default number of characters kept by [`truncate_for_log`] callers.
pub const LOG_PREVIEW_CHARS: usize = 100;
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Returns `text` unchanged if it has at most `max_chars` characters,
/// otherwise the first `max_chars` characters followed by a truncation marker.
///
/// Counts `char`s rather than bytes, so the cut never lands inside a
/// multi-byte sequence (the listings are full of `•` and `★`).
///
/// # Examples
///
/// ```rust
/// use vpngate_extract::truncate_for_log;
/// assert_eq!(truncate_for_log("short", 10), "short");
/// assert_eq!(truncate_for_log("0123456789", 4), "0123... [truncated]");
/// ```
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
    }
}
