use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use crate::db::Store;
use crate::error::ApiError;
use crate::models::{NewPitcher, Pitcher, validation::body_object};

// POST /pitchers - Register a pitcher
pub async fn create_pitcher(
    State(store): State<Store>,
    body: Bytes,
) -> Result<(StatusCode, Json<Pitcher>), ApiError> {
    let new = NewPitcher::from_body(&body_object(&body))?;
    let pitcher = store.insert_pitcher(new).await?;

    tracing::debug!("Created pitcher {} ({})", pitcher.id, pitcher.name);
    Ok((StatusCode::CREATED, Json(pitcher)))
}

// GET /pitchers - List all pitchers, newest first
pub async fn get_pitchers(
    State(store): State<Store>,
) -> Result<Json<Vec<Pitcher>>, ApiError> {
    let pitchers = store.list_pitchers().await?;
    Ok(Json(pitchers))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use crate::models::Pitcher;
    use axum::http::{Method, StatusCode};
    use chrono::{SubsecRound, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn create_requires_name() {
        let app = app().await;
        let bodies = [
            None,
            Some(json!({})),
            Some(json!({"name": ""})),
            Some(json!({"team": "Sparta"})),
        ];
        for body in bodies {
            let (status, response) = send(&app, Method::POST, "/pitchers", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({"error": "name is required"}));
        }

        let (_, listed) = send(&app, Method::GET, "/pitchers", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn create_returns_record() {
        let app = app().await;
        let before = Utc::now().trunc_subsecs(6);
        let (status, body) = send(
            &app,
            Method::POST,
            "/pitchers",
            Some(json!({"name": "Jan Novak", "team": "Sparta", "hand": "R"})),
        )
        .await;
        let after = Utc::now();

        assert_eq!(status, StatusCode::CREATED);
        let pitcher: Pitcher = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(pitcher.name, "Jan Novak");
        assert_eq!(pitcher.team.as_deref(), Some("Sparta"));
        assert_eq!(pitcher.hand.as_deref(), Some("R"));
        assert!(pitcher.created_at >= before && pitcher.created_at <= after);
        assert_eq!(body["id"], json!(pitcher.id.to_string()));
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_round_trips() {
        let app = app().await;
        let (_, a) = send(&app, Method::POST, "/pitchers", Some(json!({"name": "A"}))).await;
        let b_body = json!({"name": "B", "hand": "L"});
        let (_, b) = send(&app, Method::POST, "/pitchers", Some(b_body)).await;

        let (status, listed) = send(&app, Method::GET, "/pitchers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([b, a]));
    }
}
