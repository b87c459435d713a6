//! Metrics collection and exposition for Prometheus.
//!
//! This module provides the registry handle, the request instrumentation
//! layer and process memory sampling.

pub mod memory;
mod middleware;
mod recorder;

pub use middleware::{
    report_record_failure, track_requests, RequestTracker, RECORD_FAILED_EVENT, UNMATCHED_ROUTE,
};
pub use recorder::{
    Metrics, MetricsError, MetricsRecorder, METRICS_CONTENT_TYPE, RESPONSE_TIME_BUCKETS,
};
