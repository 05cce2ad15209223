use std::time::Instant;

use axum::{extract::State, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};

use crate::{db, AppState};

/// Component health status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

/// Individual component health details
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Full health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
    pub database: ComponentHealth,
}

/// Create the health router
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness plus a database connectivity probe.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let started = Instant::now();
    let database = match db::ping(&state.db).await {
        Ok(()) => ComponentHealth {
            status: ComponentStatus::Up,
            message: "connected".to_string(),
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => ComponentHealth {
            status: ComponentStatus::Down,
            message: e.to_string(),
            latency_ms: None,
        },
    };

    let status = match database.status {
        ComponentStatus::Up => ComponentStatus::Up,
        ComponentStatus::Down => ComponentStatus::Down,
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
    })
}
