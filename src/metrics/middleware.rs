//! Request instrumentation layer.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use super::memory::resident_memory_bytes;
use super::recorder::{MetricsError, MetricsRecorder};
use crate::utils::log_throttle::LogThrottle;

/// Route label used for every unmatched request when collapsing is enabled.
pub const UNMATCHED_ROUTE: &str = "__unmatched__";

/// Event name and throttle key for dropped metric updates.
pub const RECORD_FAILED_EVENT: &str = "metrics.record.failed";

/// State of the instrumentation layer.
#[derive(Clone)]
pub struct RequestTracker<R> {
    recorder: R,
    log_throttle: Arc<LogThrottle>,
    collapse_unmatched_routes: bool,
}

impl<R: MetricsRecorder> RequestTracker<R> {
    pub fn new(
        recorder: R,
        log_throttle: Arc<LogThrottle>,
        collapse_unmatched_routes: bool,
    ) -> Self {
        RequestTracker {
            recorder,
            log_throttle,
            collapse_unmatched_routes,
        }
    }
}

/// Records count, latency and memory usage for every request.
///
/// The response is passed through untouched. Recording failures are logged
/// (rate limited) and dropped so they never reach the client.
pub async fn track_requests<R: MetricsRecorder>(
    State(tracker): State<RequestTracker<R>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = route_label(&req, tracker.collapse_unmatched_routes);

    let response = next.run(req).await;

    let duration_secs = start.elapsed().as_secs_f64();
    let status_code = response.status().as_u16();

    debug!(
        event_name = "http.request.completed",
        event_domain = "http",
        method = method.as_str(),
        route = route.as_str(),
        status_code,
        duration_secs,
        "request completed"
    );

    if let Err(e) = record(
        &tracker.recorder,
        method.as_str(),
        &route,
        status_code,
        duration_secs,
    ) {
        report_record_failure(&tracker.log_throttle, &e);
    }

    response
}

/// Logs a dropped metric update, at most once per throttle window.
pub fn report_record_failure(log_throttle: &LogThrottle, error: &MetricsError) {
    if let Some(suppressed_count) = log_throttle.should_emit(RECORD_FAILED_EVENT) {
        warn!(
            event_name = RECORD_FAILED_EVENT,
            event_domain = "metrics",
            error = %error,
            suppressed_count,
            "failed to record metrics"
        );
    }
}

fn record<R: MetricsRecorder>(
    recorder: &R,
    method: &str,
    route: &str,
    status_code: u16,
    duration_secs: f64,
) -> Result<(), MetricsError> {
    recorder.record_request(method, route, status_code, duration_secs)?;
    if let Some(bytes) = resident_memory_bytes() {
        recorder.record_memory_usage(bytes)?;
    }
    Ok(())
}

/// Matched route pattern when the router found one, otherwise the raw path.
fn route_label(req: &Request, collapse_unmatched: bool) -> String {
    match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None if collapse_unmatched => UNMATCHED_ROUTE.to_string(),
        None => req.uri().path().to_string(),
    }
}
