use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::Store;

pub mod health;
pub mod pitchers;
pub mod pitches;

/// Full HTTP surface, bound to a store
pub fn router(store: Store) -> Router {
    // Mobile clients and emulators call from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Root and health
        .route("/", get(|| async { "Pitch Tracker API - v1.0" }))
        .route("/health", get(health::health_check))

        // Pitcher endpoints
        .route("/pitchers", get(pitchers::get_pitchers).post(pitchers::create_pitcher))

        // Pitch endpoints
        .route("/pitches", get(pitches::get_pitches).post(pitches::create_pitch))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
