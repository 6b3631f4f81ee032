use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod id;
pub mod validation;

pub use id::{Id, IdentifierError, parse_identifier};
pub use validation::ValidationError;

use validation::{coerce_bool, coerce_f64, optional_f64, optional_string};

/// Pitcher record as stored and returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pitcher {
    pub id: Id,
    pub name: String,
    pub team: Option<String>,
    /// "R" or "L" by convention; not enforced
    pub hand: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new pitcher
#[derive(Debug, Clone, PartialEq)]
pub struct NewPitcher {
    pub name: String,
    pub team: Option<String>,
    pub hand: Option<String>,
}

impl NewPitcher {
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, ValidationError> {
        let name = match optional_string(body, "name")? {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ValidationError::Required { field: "name" }),
        };

        Ok(Self {
            name,
            team: optional_string(body, "team")?,
            hand: optional_string(body, "hand")?,
        })
    }
}

/// One recorded pitch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pitch {
    pub id: Id,
    pub pitcher_id: Id,
    pub x: f64,
    pub y: f64,
    pub in_zone: bool,
    #[serde(rename = "type")]
    pub pitch_type: String,
    pub result: String,
    pub speed_kph: Option<f64>,
    pub ts: DateTime<Utc>,
}

pub const PITCH_REQUIRED_FIELDS: [&str; 6] = ["pitcherId", "x", "y", "inZone", "type", "result"];

/// Validated input for a new pitch
#[derive(Debug, Clone, PartialEq)]
pub struct NewPitch {
    pub pitcher_id: Id,
    pub x: f64,
    pub y: f64,
    pub in_zone: bool,
    pub pitch_type: String,
    pub result: String,
    pub speed_kph: Option<f64>,
}

impl NewPitch {
    /// Checks run in a fixed order: key presence, then x/y/inZone coercion, then
    /// the pitcher identifier, then the remaining fields.
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, ValidationError> {
        let missing: Vec<&'static str> = PITCH_REQUIRED_FIELDS
            .into_iter()
            .filter(|key| !body.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields { fields: missing });
        }

        let (x, y, in_zone) = match (
            coerce_f64(&body["x"]),
            coerce_f64(&body["y"]),
            coerce_bool(&body["inZone"]),
        ) {
            (Some(x), Some(y), Some(in_zone)) => (x, y, in_zone),
            _ => return Err(ValidationError::CoordinatesAndZone),
        };

        let pitcher_id = match &body["pitcherId"] {
            Value::String(raw) => parse_identifier("pitcherId", raw)?,
            other => {
                return Err(IdentifierError {
                    field: "pitcherId",
                    value: other.to_string(),
                }
                .into());
            }
        };

        let pitch_type = optional_string(body, "type")?
            .ok_or(ValidationError::NotAString { field: "type" })?;
        let result = optional_string(body, "result")?
            .ok_or(ValidationError::NotAString { field: "result" })?;

        Ok(Self {
            pitcher_id,
            x,
            y,
            in_zone,
            pitch_type,
            result,
            speed_kph: optional_f64(body, "speedKph")?,
        })
    }
}

/// Exact-match and time-range constraints for listing pitches. Every field that is
/// set must match (logical AND).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchFilter {
    pub pitcher_id: Option<Id>,
    pub result: Option<String>,
    pub pitch_type: Option<String>,
    pub in_zone: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 200;

/// Offset pagination. Page is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Page is floored at 1; limit is clamped to 1..=200.
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// Response body for `GET /pitches`
#[derive(Debug, Serialize, Deserialize)]
pub struct PitchPage {
    pub items: Vec<Pitch>,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn pitch_body() -> Map<String, Value> {
        object(json!({
            "pitcherId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "x": 0.12,
            "y": "-0.4",
            "inZone": true,
            "type": "fastball",
            "result": "strike",
        }))
    }

    #[test]
    fn pitcher_requires_name() {
        for body in [json!({}), json!({"name": ""}), json!({"name": null, "team": "Sparta"})] {
            assert_eq!(
                NewPitcher::from_body(&object(body)),
                Err(ValidationError::Required { field: "name" })
            );
        }
    }

    #[test]
    fn pitcher_keeps_optional_fields() {
        let pitcher = NewPitcher::from_body(&object(json!({
            "name": "Jan Novak",
            "team": "Sparta",
            "hand": "L",
        })))
        .unwrap();
        assert_eq!(pitcher.name, "Jan Novak");
        assert_eq!(pitcher.team.as_deref(), Some("Sparta"));
        assert_eq!(pitcher.hand.as_deref(), Some("L"));
    }

    #[test]
    fn pitch_reports_every_missing_key() {
        for key in PITCH_REQUIRED_FIELDS {
            let mut body = pitch_body();
            body.remove(key);
            assert_eq!(
                NewPitch::from_body(&body),
                Err(ValidationError::MissingFields { fields: vec![key] })
            );
        }
    }

    #[test]
    fn pitch_rejects_non_numeric_coordinates() {
        let mut body = pitch_body();
        body.insert("x".into(), json!("abc"));
        let err = NewPitch::from_body(&body).unwrap_err();
        assert_eq!(err.to_string(), "x,y must be numbers; inZone bool");
    }

    #[test]
    fn pitch_rejects_non_boolean_zone() {
        let mut body = pitch_body();
        body.insert("inZone".into(), json!("maybe"));
        assert_eq!(NewPitch::from_body(&body), Err(ValidationError::CoordinatesAndZone));
    }

    #[test]
    fn coercion_is_checked_before_identifier() {
        let mut body = pitch_body();
        body.insert("pitcherId".into(), json!("bogus"));
        body.insert("y".into(), json!(null));
        assert_eq!(NewPitch::from_body(&body), Err(ValidationError::CoordinatesAndZone));
    }

    #[test]
    fn pitch_rejects_malformed_pitcher_id() {
        let mut body = pitch_body();
        body.insert("pitcherId".into(), json!("bogus"));
        assert!(matches!(
            NewPitch::from_body(&body),
            Err(ValidationError::Identifier(IdentifierError { field: "pitcherId", .. }))
        ));
    }

    #[test]
    fn pitch_coerces_fields() {
        let mut body = pitch_body();
        body.insert("speedKph".into(), json!(141.5));
        let pitch = NewPitch::from_body(&body).unwrap();
        assert_eq!(pitch.x, 0.12);
        assert_eq!(pitch.y, -0.4);
        assert!(pitch.in_zone);
        assert_eq!(pitch.pitch_type, "fastball");
        assert_eq!(pitch.speed_kph, Some(141.5));
    }

    #[test]
    fn speed_is_optional_and_nullable() {
        let mut body = pitch_body();
        assert_eq!(NewPitch::from_body(&body).unwrap().speed_kph, None);
        body.insert("speedKph".into(), Value::Null);
        assert_eq!(NewPitch::from_body(&body).unwrap().speed_kph, None);
        body.insert("speedKph".into(), json!("fast"));
        assert_eq!(
            NewPitch::from_body(&body),
            Err(ValidationError::NotANumber { field: "speedKph" })
        );
    }

    #[test]
    fn pagination_clamps() {
        assert_eq!(Pagination::new(1, 500).limit, 200);
        assert_eq!(Pagination::new(1, 0).limit, 1);
        assert_eq!(Pagination::new(1, -5).limit, 1);
        assert_eq!(Pagination::new(0, 10).page, 1);
        assert_eq!(Pagination::default(), Pagination { page: 1, limit: 50 });
    }

    #[test]
    fn pagination_offset() {
        assert_eq!(Pagination::new(1, 2).offset(), 0);
        assert_eq!(Pagination::new(2, 2).offset(), 2);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn pitch_serializes_with_wire_names() {
        let pitch = Pitch {
            id: id::new_identifier(),
            pitcher_id: id::new_identifier(),
            x: 1.0,
            y: 2.0,
            in_zone: false,
            pitch_type: "curveball".into(),
            result: "ball".into(),
            speed_kph: None,
            ts: Utc::now(),
        };
        let value = serde_json::to_value(&pitch).unwrap();
        assert_eq!(value["pitcherId"], json!(pitch.pitcher_id.to_string()));
        assert_eq!(value["type"], json!("curveball"));
        assert_eq!(value["inZone"], json!(false));
        assert_eq!(value["speedKph"], Value::Null);
        assert!(value["ts"].as_str().unwrap().contains('T'));
    }
}
