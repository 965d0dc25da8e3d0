//! Lenient coercion of loosely typed API payloads.
//!
//! Every helper here is fail-open: a malformed value becomes a default
//! (today's date, the current time, an enum fallback, zero) rather than an
//! error. Only [`require_id`] can fail.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

use crate::error::ApiError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Epoch values above this are taken as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p"];

/// An enum carried on the wire as one of a fixed set of strings.
///
/// Unknown values coerce to [`LenientEnum::FALLBACK`] instead of failing.
pub trait LenientEnum: Sized + Copy + PartialEq + 'static {
    /// Field name used in log messages.
    const FIELD: &'static str;
    /// Allowed values, in wire order.
    const ALL: &'static [Self];
    const FALLBACK: Self;

    fn as_str(&self) -> &'static str;

    /// Strict lookup. Case-insensitive, `-` and spaces match `_`.
    fn parse(raw: &str) -> Option<Self> {
        let key = enum_key(raw);
        Self::ALL.iter().copied().find(|v| v.as_str() == key)
    }

    /// Lenient lookup of an optional JSON value.
    fn coerce(raw: Option<&Value>) -> Self {
        let Some(s) = raw.and_then(Value::as_str) else {
            if let Some(other) = raw.filter(|v| !v.is_null()) {
                log::warn!("{}: unexpected value {}, using {}", Self::FIELD, other, Self::FALLBACK.as_str());
            }
            return Self::FALLBACK;
        };
        Self::parse(s).unwrap_or_else(|| {
            if !s.trim().is_empty() {
                log::warn!("{}: unknown value {:?}, using {}", Self::FIELD, s, Self::FALLBACK.as_str());
            }
            Self::FALLBACK
        })
    }

    /// Comma-separated list of allowed values, for help and error text.
    fn allowed() -> String {
        Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
    }
}

fn enum_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

pub fn now_time() -> String {
    Local::now().time().format(TIME_FORMAT).to_string()
}

/// Parse the date formats the API is known to emit.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y").ok()
}

fn parse_epoch(n: i64) -> Option<NaiveDate> {
    let dt = if n.abs() > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)?
    } else {
        DateTime::from_timestamp(n, 0)?
    };
    Some(dt.with_timezone(&Local).date_naive())
}

/// Canonicalize a date string to `YYYY-MM-DD`, or today when unparseable.
pub fn normalize_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(d) => d.format(DATE_FORMAT).to_string(),
        None => today(),
    }
}

/// Canonicalize a time string to `HH:MM`, or the current time when unparseable.
pub fn normalize_time(raw: &str) -> String {
    let s = raw.trim();
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return t.format(TIME_FORMAT).to_string();
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return dt.time().format(TIME_FORMAT).to_string();
        }
    }
    now_time()
}

fn date_value(key: &str, raw: &Value) -> Option<String> {
    let parsed = match raw {
        Value::Null => return None,
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_i64().and_then(parse_epoch),
        _ => None,
    };
    Some(match parsed {
        Some(d) => d.format(DATE_FORMAT).to_string(),
        None => {
            log::warn!("{}: unparseable date {}, using today", key, raw);
            today()
        }
    })
}

/// A required date field. Absent or malformed values become today.
pub fn date_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).and_then(|v| date_value(key, v)).unwrap_or_else(today)
}

/// An optional date field. Absent stays `None`; malformed becomes today.
pub fn optional_date_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => date_value(key, v),
        None => None,
    }
}

pub fn time_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key).and_then(Value::as_str) {
        Some(s) => normalize_time(s),
        None => now_time(),
    }
}

/// The identifying field of a record: a non-empty string or a number.
pub fn require_id(
    obj: &Map<String, Value>,
    entity: &'static str,
    field: &'static str,
) -> Result<String, ApiError> {
    id_value(obj.get(field)).ok_or(ApiError::InvalidData { entity, field })
}

/// A foreign key that may arrive as a string or a number.
pub fn optional_id_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    id_value(obj.get(key))
}

fn id_value(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    optional_string_field(obj, key).unwrap_or_default()
}

pub fn optional_string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-negative integer coercion: negatives become 0, fractions truncate.
pub fn coerce_count(raw: Option<&Value>) -> u32 {
    let n = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

pub fn count_field(obj: &Map<String, Value>, key: &str) -> u32 {
    coerce_count(obj.get(key))
}

pub fn optional_count_field(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        raw => Some(coerce_count(raw)),
    }
}

pub fn coerce_bool(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

pub fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    coerce_bool(obj.get(key))
}

/// Keywords as a JSON array or a comma-separated string.
pub fn keywords_field(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    let items: Vec<String> = match obj.get(key) {
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Borrow a payload as an object, or report it as missing its identifier.
pub fn as_record<'a>(
    raw: &'a Value,
    entity: &'static str,
    id_field: &'static str,
) -> Result<&'a Map<String, Value>, ApiError> {
    raw.as_object().ok_or(ApiError::InvalidData {
        entity,
        field: id_field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn date_roundtrip() {
        assert_eq!(normalize_date("2024-03-05"), "2024-03-05");
    }

    #[test]
    fn unparseable_date_is_today() {
        assert_eq!(normalize_date("not a date"), today());
        assert_eq!(normalize_date(""), today());
    }

    #[test]
    fn date_variants() {
        assert_eq!(normalize_date("2024-03-05T10:15:00+02:00"), "2024-03-05");
        assert_eq!(normalize_date("2024-03-05T10:15:00.000000Z"), "2024-03-05");
        assert_eq!(normalize_date("2024-03-05 08:00:00"), "2024-03-05");
        assert_eq!(normalize_date("03/05/2024"), "2024-03-05");
    }

    #[test]
    fn time_variants() {
        assert_eq!(normalize_time("09:30:59"), "09:30");
        assert_eq!(normalize_time("9:05"), "09:05");
        assert_eq!(normalize_time("02:45 PM"), "14:45");
        assert_eq!(normalize_time("2024-03-05 18:20:00"), "18:20");
    }

    #[test]
    fn optional_dates() {
        let o = obj(json!({"a": null, "b": "", "c": "garbage", "d": "2023-12-31"}));
        assert_eq!(optional_date_field(&o, "a"), None);
        assert_eq!(optional_date_field(&o, "b"), None);
        assert_eq!(optional_date_field(&o, "c"), Some(today()));
        assert_eq!(optional_date_field(&o, "d"), Some("2023-12-31".to_string()));
        assert_eq!(optional_date_field(&o, "missing"), None);
        assert_eq!(date_field(&o, "missing"), today());
    }

    #[test]
    fn counts_are_clamped() {
        assert_eq!(coerce_count(Some(&json!(-4))), 0);
        assert_eq!(coerce_count(Some(&json!(2.9))), 2);
        assert_eq!(coerce_count(Some(&json!("45"))), 45);
        assert_eq!(coerce_count(Some(&json!("abc"))), 0);
        assert_eq!(coerce_count(None), 0);
    }

    #[test]
    fn ids_accept_strings_and_numbers() {
        let o = obj(json!({"a": "  7 ", "b": 12, "c": "", "d": null}));
        assert_eq!(require_id(&o, "Note", "a").unwrap(), "7");
        assert_eq!(require_id(&o, "Note", "b").unwrap(), "12");
        assert!(require_id(&o, "Note", "c").is_err());
        assert!(require_id(&o, "Note", "d").is_err());
        assert_eq!(
            require_id(&o, "Note", "e"),
            Err(ApiError::InvalidData { entity: "Note", field: "e" })
        );
    }

    #[test]
    fn keywords_from_array_or_string() {
        let o = obj(json!({"a": ["feed", " hay ", ""], "b": "vet, hoof ,", "c": 3}));
        assert_eq!(keywords_field(&o, "a"), vec!["feed", "hay"]);
        assert_eq!(keywords_field(&o, "b"), vec!["vet", "hoof"]);
        assert!(keywords_field(&o, "c").is_empty());
    }

    #[test]
    fn booleans() {
        assert!(coerce_bool(Some(&json!(1))));
        assert!(coerce_bool(Some(&json!("true"))));
        assert!(!coerce_bool(Some(&json!("0"))));
        assert!(!coerce_bool(None));
    }
}
