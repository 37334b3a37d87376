//! # models::serde_helpers
//!
//! Lenient decoding for form-style trade payloads.
//!
//! The journal frontend posts whatever its inputs hold: `""` for an untouched
//! `datetime-local`, `"10"` or `10` for a number input, timestamps without
//! seconds or offset.  Every helper here maps blank strings to `None` and
//! accepts both JSON numbers and numeric strings.
//!
//! The `patch_*` variants wrap the result in an extra `Some` so a partial
//! update can tell an explicit `null` / `""` (clear the field) apart from a
//! missing key (keep the field).  Use them with `#[serde(default)]`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Naive timestamp layouts tried after RFC 3339.  Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ─── Parsers ──────────────────────────────────────────────────────────────────

/// Parses an RFC 3339 timestamp (any offset) or one of the naive layouts.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parses `YYYY-MM-DD`, falling back to the date part of a full timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(raw).map(|dt| dt.date_naive()))
}

// ─── Raw shapes ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

fn blank_to_none(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn number<'de, D, T>(deserializer: D, what: &'static str) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + std::str::FromStr,
{
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => match blank_to_none(text) {
            None => Ok(None),
            Some(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid {what} `{text}`"))),
        },
    }
}

// ─── Field decoders ───────────────────────────────────────────────────────────

/// Free text; blank becomes `None`.
pub fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.and_then(blank_to_none))
}

/// Whole number (quantity).
pub fn opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    number(deserializer, "integer")
}

/// Decimal amount (price / premium / strike).  `NaN` and infinities are
/// rejected; `str::parse` would otherwise accept `"NaN"`, `"inf"` and
/// overflowing literals like `"1e999"`.
pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match number::<D, f64>(deserializer, "decimal")? {
        Some(n) if !n.is_finite() => Err(de::Error::custom(format!("invalid decimal `{n}`"))),
        other => Ok(other),
    }
}

pub fn opt_datetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    match opt_text(deserializer)? {
        None => Ok(None),
        Some(text) => parse_datetime(&text)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{text}`"))),
    }
}

pub fn opt_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match opt_text(deserializer)? {
        None => Ok(None),
        Some(text) => parse_date(&text)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date `{text}`"))),
    }
}

macro_rules! patch_decoder {
    ($($name:ident => $inner:ident : $ty:ty),* $(,)?) => {
        $(
            pub fn $name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<$ty>>, D::Error> {
                $inner(deserializer).map(Some)
            }
        )*
    };
}

patch_decoder! {
    patch_text     => opt_text:     String,
    patch_i64      => opt_i64:      i64,
    patch_f64      => opt_f64:      f64,
    patch_datetime => opt_datetime: DateTime<Utc>,
    patch_date     => opt_date:     NaiveDate,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
