//! HTTP route definitions and handlers.
//!
//! This module organizes all HTTP endpoints into logical groups:
//! the landing page, health checks, simulated signals and metrics exposition.

mod health_routes;
mod metrics_routes;
mod root_routes;
mod simulation_routes;

pub use health_routes::HealthResponse;
pub use root_routes::ROOT_MESSAGE;
pub use simulation_routes::{UsersResponse, SIMULATED_ERROR, SIMULATED_ERROR_MESSAGE};

use crate::metrics::{track_requests, Metrics, RequestTracker};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::http::StatusCode;
use axum::{middleware, Router};

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router, wraps every route and
/// the fallback in the request instrumentation layer and attaches the
/// application state for access in handlers.
pub fn create_router(state: AppState) -> Router {
    let tracker = RequestTracker::new(
        state.metrics.clone(),
        state.log_throttle.clone(),
        state.config.metrics.collapse_unmatched_routes,
    );

    Router::new()
        .merge(root_routes::routes())
        .merge(health_routes::routes())
        .merge(simulation_routes::routes())
        .merge(metrics_routes::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            tracker,
            track_requests::<Metrics>,
        ))
        .with_state(state)
}

async fn not_found() -> HTTPError {
    HTTPError::new(StatusCode::NOT_FOUND, "Not found")
}
