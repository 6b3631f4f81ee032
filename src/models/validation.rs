use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::id::IdentifierError;

/// Client-caused input errors. All of these surface as 400 responses.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("x,y must be numbers; inZone bool")]
    CoordinatesAndZone,

    #[error("{field} must be a string")]
    NotAString { field: &'static str },

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} must be an integer: '{value}'")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} is not an ISO-8601 timestamp: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// Interpret a request body as a JSON object. Absent, malformed, or non-object
/// bodies all become an empty map so the required-field checks report them.
pub fn body_object(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Numbers and numeric strings, finite only.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Booleans, "true"/"false" in any case, and the integers 0 and 1.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// Absent and null are both `None`; anything other than a string is rejected.
pub fn optional_string(
    body: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::NotAString { field }),
    }
}

pub fn optional_f64(
    body: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_f64(value)
            .map(Some)
            .ok_or(ValidationError::NotANumber { field }),
    }
}

/// Integers beyond the `i64` range saturate instead of failing, so oversized
/// limits still fall through to the usual clamping.
pub fn parse_integer(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(if negative { i64::MIN } else { i64::MAX });
    }

    Err(ValidationError::NotAnInteger {
        field,
        value: raw.to_string(),
    })
}

/// Query flags match only the literal "true", case-insensitively.
pub fn query_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// Accepts RFC 3339 timestamps (seconds optional), offset-less date-times (taken
/// as UTC), and bare dates (midnight UTC).
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw_trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw_trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M%:z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw_trimmed, format) {
            return Ok(ts.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw_trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw_trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })
}
