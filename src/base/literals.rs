//! Total try-parsers for primitive literal text.
//!
//! Each parser returns `None` for text that is not a valid literal of its
//! kind and never panics. Callers decide what a failure means; the semantic
//! layer turns it into a default value plus a diagnostic.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Hex-encoded bytes, two digits per byte (`"0A0B"`).
pub fn try_parse_binary(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    if text.len() % 2 != 0 {
        return None;
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| Some((hex_digit(pair[0])? << 4) | hex_digit(pair[1])?))
        .collect()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// `true`/`false` in any case, or `1`/`0`.
pub fn try_parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

pub fn try_parse_guid(text: &str) -> Option<Uuid> {
    Uuid::try_parse(text.trim()).ok()
}

/// `yyyy-mm-ddThh:mm[:ss[.fffffff]]`, no offset.
pub fn try_parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// RFC 3339 timestamp with an offset.
pub fn try_parse_date_time_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text.trim()).ok()
}

/// Decimal text with an optional `M` suffix.
pub fn try_parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    let text = text.strip_suffix(['M', 'm']).unwrap_or(text);
    Decimal::from_str(text).ok()
}

/// Floating point text with an optional `D`/`F` suffix; `INF`, `-INF` and
/// `NaN` are accepted.
pub fn try_parse_floating(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(value) = f64::from_str(text) {
        return Some(value);
    }
    f64::from_str(text.strip_suffix(['D', 'd', 'F', 'f'])?).ok()
}

/// Signed 64-bit integer text with an optional `L` suffix.
pub fn try_parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let text = text.strip_suffix(['L', 'l']).unwrap_or(text);
    i64::from_str(text).ok()
}

/// Time of day `hh:mm[:ss[.fffffff]]`.
pub fn try_parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}
