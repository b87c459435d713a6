//! Endpoints producing simulated errors and signals.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::{report_record_failure, MetricsRecorder};
use crate::simulator::random_active_users;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

pub const SIMULATED_ERROR: &str = "simulated_error";
pub const SIMULATED_ERROR_MESSAGE: &str = "Simulated error for testing";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/simulate-error", get(simulate_error))
        .route("/users", get(users))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UsersResponse {
    pub active_users: i64,
}

/// Counts a `simulated_error` and always answers 500.
async fn simulate_error(State(state): State<AppState>) -> HTTPError {
    if let Err(e) = state.metrics.record_error(SIMULATED_ERROR) {
        report_record_failure(&state.log_throttle, &e);
    }
    info!(
        event_name = "simulation.error",
        event_domain = "simulation",
        error_type = SIMULATED_ERROR,
        "simulated error served"
    );
    HTTPError::internal(SIMULATED_ERROR_MESSAGE)
}

/// Independent draw; deliberately not tied to the `app_active_users` gauge.
async fn users() -> Json<UsersResponse> {
    Json(UsersResponse {
        active_users: random_active_users(),
    })
}
