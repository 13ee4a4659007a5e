//! Keep-alive and read-only HTTP API.
//!
//! - `GET /`: plain text banner, for uptime pingers
//! - `GET /api/health`: status, version and counters
//! - `GET /api/leaderboard?page=k`: one leaderboard page as JSON
//!
//! Handlers only read the store. The store lock is held for the duration of
//! a single `list_all`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use streak_core::{Page, leaderboard};
use streak_store::RecordStore;

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(banner))
        .route("/api/health", get(health))
        .route("/api/leaderboard", get(get_leaderboard))
}

async fn banner(State(state): State<Arc<AppState>>) -> String {
    format!("💗 {} activo 24/7", state.config.appearance.brand)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub records: usize,
    pub events: u64,
    pub streak_updates: u64,
    pub failures: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let records = state.store.lock().await.len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        started_at: state.started_at,
        records,
        events: state.stats.events(),
        streak_updates: state.stats.streak_updates(),
        failures: state.stats.failures(),
    })
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// 0-based page, clamped to the available range.
    #[serde(default)]
    pub page: i64,
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Page>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let records = state.store.lock().await.list_all();
    Ok(Json(leaderboard::page(records, query.page)))
}

/// API error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
