//! Health check endpoints.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(health_check))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 / ISO-8601 UTC time with millisecond precision.
    pub timestamp: String,
    /// Seconds since the service state was created.
    pub uptime: f64,
}

/// Liveness and readiness probe.
///
/// Touches nothing but the clock so it cannot hang.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime().as_secs_f64(),
    })
}
