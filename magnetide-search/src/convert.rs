//! Total conversion helpers for untrusted upstream data.
//!
//! Every function here returns a usable value for any input. Upstream fields
//! are coerced through these helpers so that one malformed field never aborts
//! normalization of a record or a search.

use chrono::DateTime;
use serde_json::Value;

/// UDP trackers appended to every synthesized magnet link, in order.
pub const TRACKERS: &[&str] = &[
    "udp://tracker.coppersurfer.tk:6969/announce",
    "udp://9.rarbg.to:2920/announce",
    "udp://tracker.opentrackr.org:1337",
    "udp://tracker.internetwarriors.net:1337/announce",
    "udp://tracker.leechers-paradise.org:6969/announce",
    "udp://tracker.pirateparty.gr:6969/announce",
    "udp://tracker.cyberia.is:6969/announce",
];

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Parses the leading integer of `value`, ignoring leading whitespace and any
/// trailing garbage. Saturates instead of overflowing.
fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = digits
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(digits.len());
        &digits[..end]
    };
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses an integer, returning 0 on any parse failure.
pub fn safe_parse_int(value: &str) -> i64 {
    parse_leading_int(value).unwrap_or(0)
}

/// Clamps a parsed integer to the non-negative range used for counts.
pub fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Formats a byte count given as a string with one decimal place.
///
/// Unparsable or negative input yields `"0 B"`.
pub fn humanize_size(raw_bytes: &str) -> String {
    let bytes = match parse_leading_int(raw_bytes) {
        Some(bytes) if bytes >= 0 => bytes,
        _ => return "0 B".to_string(),
    };

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.1} {}", SIZE_UNITS[unit])
}

/// Builds a magnet URI for `info_hash` carrying `display_name` and [`TRACKERS`].
pub fn build_magnet_uri(info_hash: &str, display_name: &str) -> String {
    build_magnet_uri_with_trackers(info_hash, display_name, TRACKERS)
}

/// Builds a magnet URI with an explicit tracker list.
///
/// `dn` is always present, empty when the display name is.
pub fn build_magnet_uri_with_trackers(
    info_hash: &str,
    display_name: &str,
    trackers: &[&str],
) -> String {
    let mut uri = format!(
        "magnet:?xt=urn:btih:{info_hash}&dn={}",
        urlencoding::encode(display_name)
    );
    for tracker in trackers {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(tracker));
    }
    uri
}

/// Renders epoch seconds as an RFC 7231 style UTC date, e.g.
/// `Tue, 14 Nov 2023 22:13:20 GMT`. Out-of-range values fall back to the epoch.
pub fn epoch_to_utc_string(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Reads a field as a string. Numbers and booleans are stringified; anything
/// else, including absence, becomes an empty string.
pub fn field_str(object: &Value, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Reads a field as an integer. Numeric strings are parsed; floats truncate;
/// anything else becomes 0.
pub fn field_int(object: &Value, key: &str) -> i64 {
    match object.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => safe_parse_int(s),
        _ => 0,
    }
}

/// Reads a field as a non-empty string, `None` if missing or blank.
pub fn field_opt_str(object: &Value, key: &str) -> Option<String> {
    let value = field_str(object, key);
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
