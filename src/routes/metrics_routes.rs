//! Metrics exposition endpoint.

use crate::metrics::METRICS_CONTENT_TYPE;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::error;

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Returns all collected metrics in Prometheus text format, or a 500 carrying
/// the encoder error.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    let metrics_text = state.metrics.render().map_err(|e| {
        error!(
            event_name = "metrics.render.failed",
            event_domain = "metrics",
            error = %e,
            "failed to render metrics"
        );
        HTTPError::internal(e.to_string())
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        metrics_text,
    ))
}
