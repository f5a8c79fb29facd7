/**
 * Health Routes
 * Liveness and database probes
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
    pub uptime: u64,
}

/// Database check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
        uptime: SERVER_START.elapsed().as_secs(),
    })
}

/// GET /health/database
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::health_check(state.store.pool()).await {
        Ok(duration) => (
            StatusCode::OK,
            Json(DatabaseHealthResponse {
                status: "healthy".to_string(),
                timestamp: Utc::now(),
                response_time: Some(duration.as_millis() as u64),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(DatabaseHealthResponse {
                    status: "unhealthy".to_string(),
                    timestamp: Utc::now(),
                    response_time: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
