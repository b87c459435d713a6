//! Shared application state.
//!
//! Contains the state that is shared across all request handlers and the
//! instrumentation layer.

use crate::config::Config;
use crate::metrics::Metrics;
use crate::utils::log_throttle::LogThrottle;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<Config>,
    /// Metrics registry and instruments.
    pub metrics: Metrics,
    /// Rate limiter for warnings raised on the request path.
    pub log_throttle: Arc<LogThrottle>,
    /// Process start, the reference point for the uptime reported by `/healthz`.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, metrics: Metrics, started_at: Instant) -> Self {
        AppState {
            config,
            metrics,
            log_throttle: Arc::new(LogThrottle::default()),
            started_at,
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
