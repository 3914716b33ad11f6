//! HTTP/WebSocket API for the betting game server.
//!
//! The API surface is deliberately small:
//!
//! - `GET /health` - database connectivity and active session count
//! - `GET /ws` - WebSocket endpoint for game commands and state updates
//!
//! All game interaction flows over the WebSocket: clients send tagged
//! JSON commands (`start_hand`, `action`, `close_game`, `ping`) and every
//! connected observer receives an `update` broadcast after each
//! successfully processed action.

pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use holdem_core::db::{Database, PgLedger};
use holdem_core::session::GameManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Defaults applied when a `start_hand` command omits its knobs.
#[derive(Clone, Copy, Debug)]
pub struct SessionDefaults {
    pub blind_interval_secs: i64,
    pub small_blind: i64,
}

/// Application state shared across HTTP handlers and WebSocket
/// connections. Cloned per request; cheap due to the Arc wrappers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<GameManager<PgLedger>>,
    pub db: Database,
    pub defaults: SessionDefaults,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = state.db.health_check().await.is_ok();
    let active_games = state.manager.active_games().await;

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "active_games": active_games,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
