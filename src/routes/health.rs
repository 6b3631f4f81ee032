use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::db::Store;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    store: &'static str,
    timestamp: i64,
}

// GET /health - Liveness plus store reachability
pub async fn health_check(State(store): State<Store>) -> (StatusCode, Json<HealthResponse>) {
    let (status, store_status) = match store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Health check could not reach store: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    let response = HealthResponse {
        status: if status == StatusCode::OK { "ok" } else { "degraded" },
        store: store_status,
        timestamp: chrono::Utc::now().timestamp(),
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn reports_ok() {
        let (status, body) = send(&app().await, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "ok");
        assert!(body["timestamp"].as_i64().unwrap() > 0);
    }
}
