use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use crate::db::Store;
use crate::error::ApiError;
use crate::models::{
    DEFAULT_PAGE_LIMIT, NewPitch, Pagination, Pitch, PitchFilter, PitchPage, ValidationError,
    parse_identifier,
    validation::{body_object, parse_integer, parse_timestamp, query_flag},
};

/// Query parameters for listing pitches. Everything arrives as raw text so bad
/// values produce the same structured 400 as bad bodies.
#[derive(Debug, Default, PartialEq)]
pub struct PitchQuery {
    pub pitcher_id: Option<String>,
    pub result: Option<String>,
    pub pitch_type: Option<String>,
    pub in_zone: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

// Empty parameters count as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl PitchQuery {
    /// The first value of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "pitcherId" => &mut query.pitcher_id,
                "result" => &mut query.result,
                "type" => &mut query.pitch_type,
                "inZone" => &mut query.in_zone,
                "from" => &mut query.from,
                "to" => &mut query.to,
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    pub fn into_parts(self) -> Result<(PitchFilter, Pagination), ValidationError> {
        let filter = PitchFilter {
            pitcher_id: non_empty(self.pitcher_id)
                .map(|raw| parse_identifier("pitcherId", &raw))
                .transpose()?,
            result: non_empty(self.result),
            pitch_type: non_empty(self.pitch_type),
            in_zone: non_empty(self.in_zone).map(|raw| query_flag(&raw)),
            from: non_empty(self.from)
                .map(|raw| parse_timestamp("from", &raw))
                .transpose()?,
            to: non_empty(self.to)
                .map(|raw| parse_timestamp("to", &raw))
                .transpose()?,
        };

        let page = non_empty(self.page)
            .map(|raw| parse_integer("page", &raw))
            .transpose()?
            .unwrap_or(1);
        let limit = non_empty(self.limit)
            .map(|raw| parse_integer("limit", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        Ok((filter, Pagination::new(page, limit)))
    }
}

// POST /pitches - Record a pitch
pub async fn create_pitch(
    State(store): State<Store>,
    body: Bytes,
) -> Result<(StatusCode, Json<Pitch>), ApiError> {
    let new = NewPitch::from_body(&body_object(&body))?;
    let pitch = store.insert_pitch(new).await?;

    tracing::debug!("Recorded pitch {} for pitcher {}", pitch.id, pitch.pitcher_id);
    Ok((StatusCode::CREATED, Json(pitch)))
}

// GET /pitches?pitcherId=..&result=strike&page=2 - Filtered, paginated pitch log
pub async fn get_pitches(
    State(store): State<Store>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PitchPage>, ApiError> {
    let (filter, pagination) = PitchQuery::from_pairs(pairs).into_parts()?;
    let items = store.list_pitches(&filter, pagination).await?;

    Ok(Json(PitchPage {
        items,
        page: pagination.page,
        limit: pagination.limit,
    }))
}
