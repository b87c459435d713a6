//! Metrics recording implementation using Prometheus.

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use thiserror::Error;

/// Content type of the text exposition format served on `/metrics`.
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Upper bounds of the response time histogram, in seconds. `+Inf` is implicit.
pub const RESPONSE_TIME_BUCKETS: [f64; 5] = [0.1, 0.5, 1.0, 2.0, 5.0];

const REQUEST_LABELS: [&str; 3] = ["method", "route", "status_code"];

/// Errors raised by the metrics registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("a metric named '{0}' is already registered")]
    DuplicateName(String),
    #[error("failed to serialize metrics: {0}")]
    Serialization(String),
    #[error("value {value} is out of range for {metric}")]
    OutOfRange { metric: &'static str, value: u64 },
    #[error(transparent)]
    Prometheus(#[from] prometheus::Error),
}

/// Trait for recording application metrics.
///
/// Every method reports failures instead of panicking so that callers on the
/// request path can decide to drop them.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records one finished request and its latency.
    fn record_request(
        &self,
        method: &str,
        route: &str,
        status_code: u16,
        duration_secs: f64,
    ) -> Result<(), MetricsError>;

    /// Records the current memory footprint of the process.
    fn record_memory_usage(&self, bytes: u64) -> Result<(), MetricsError>;

    /// Records one occurrence of an application error.
    fn record_error(&self, error_type: &str) -> Result<(), MetricsError>;

    /// Overwrites the active users signal.
    fn set_active_users(&self, count: i64) -> Result<(), MetricsError>;
}

/// Prometheus metrics collector.
///
/// Owns a private registry; clones share the same instruments.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Request metrics
    requests_total: IntCounterVec,
    response_time_seconds: HistogramVec,

    // Process metrics
    memory_usage_bytes: IntGauge,

    // Application metrics
    errors_total: IntCounterVec,
    active_users: IntGauge,
}

impl Metrics {
    /// Creates a new metrics instance with its own Prometheus registry.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Arc::new(Registry::new());

        let requests_total = IntCounterVec::new(
            Opts::new(
                "app_requests_total",
                "Total number of requests received by the application",
            ),
            &REQUEST_LABELS,
        )?;

        let response_time_seconds = HistogramVec::new(
            HistogramOpts::new(
                "app_response_time_seconds",
                "Request response time in seconds",
            )
            .buckets(RESPONSE_TIME_BUCKETS.to_vec()),
            &REQUEST_LABELS,
        )?;

        let memory_usage_bytes = IntGauge::new(
            "app_memory_usage_bytes",
            "Memory used by the application in bytes",
        )?;

        let errors_total = IntCounterVec::new(
            Opts::new("app_errors_total", "Total application errors by type"),
            &["error_type"],
        )?;

        let active_users = IntGauge::new(
            "app_active_users",
            "Number of active users of the application",
        )?;

        let metrics = Metrics {
            registry,
            requests_total,
            response_time_seconds,
            memory_usage_bytes,
            errors_total,
            active_users,
        };

        metrics.register(Box::new(metrics.requests_total.clone()))?;
        metrics.register(Box::new(metrics.response_time_seconds.clone()))?;
        metrics.register(Box::new(metrics.memory_usage_bytes.clone()))?;
        metrics.register(Box::new(metrics.errors_total.clone()))?;
        metrics.register(Box::new(metrics.active_users.clone()))?;

        Ok(metrics)
    }

    /// Adds an instrument to the registry.
    ///
    /// Fails with [`MetricsError::DuplicateName`] when any of the collector's
    /// metric names is already taken.
    pub fn register(&self, collector: Box<dyn Collector>) -> Result<(), MetricsError> {
        let names = collector
            .desc()
            .iter()
            .map(|desc| desc.fq_name.clone())
            .collect::<Vec<_>>()
            .join(", ");

        self.registry.register(collector).map_err(|e| match e {
            prometheus::Error::AlreadyReg => MetricsError::DuplicateName(names),
            prometheus::Error::Msg(ref msg) if msg.contains("same fully-qualified name") => {
                MetricsError::DuplicateName(names)
            }
            other => MetricsError::Prometheus(other),
        })
    }

    /// Registers the process collector (Linux only) and the `app_info` gauge.
    ///
    /// Calling this twice on the same registry fails with
    /// [`MetricsError::DuplicateName`].
    pub fn collect_defaults(&self) -> Result<(), MetricsError> {
        #[cfg(target_os = "linux")]
        self.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        let info = IntGaugeVec::new(
            Opts::new("app_info", "Application build information"),
            &["version"],
        )?;
        info.get_metric_with_label_values(&[env!("CARGO_PKG_VERSION")])?
            .set(1);
        self.register(Box::new(info))
    }

    /// Handle on the active users gauge, for writers outside the request path.
    pub fn active_users_gauge(&self) -> IntGauge {
        self.active_users.clone()
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Serialization(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Serialization(e.to_string()))
    }

    /// Current value of the `app_requests_total` series, 0 when it does not exist.
    pub fn request_count(&self, method: &str, route: &str, status_code: u16) -> u64 {
        let status = status_code.to_string();
        counter_value(
            &self.requests_total.collect(),
            &[("method", method), ("route", route), ("status_code", &status)],
        )
    }

    /// Current value of the `app_errors_total` series, 0 when it does not exist.
    pub fn error_count(&self, error_type: &str) -> u64 {
        counter_value(&self.errors_total.collect(), &[("error_type", error_type)])
    }

    pub fn active_users(&self) -> i64 {
        self.active_users.get()
    }

    pub fn memory_usage_bytes(&self) -> i64 {
        self.memory_usage_bytes.get()
    }
}

/// Looks a series up without creating it, unlike `get_metric_with_label_values`.
fn counter_value(families: &[MetricFamily], labels: &[(&str, &str)]) -> u64 {
    families
        .iter()
        .flat_map(|family| family.get_metric())
        .find(|metric| {
            let pairs = metric.get_label();
            pairs.len() == labels.len()
                && labels.iter().all(|(name, value)| {
                    pairs
                        .iter()
                        .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
                })
        })
        .map(|metric| metric.get_counter().get_value() as u64)
        .unwrap_or(0)
}

impl MetricsRecorder for Metrics {
    fn record_request(
        &self,
        method: &str,
        route: &str,
        status_code: u16,
        duration_secs: f64,
    ) -> Result<(), MetricsError> {
        let status = status_code.to_string();
        let labels = [method, route, status.as_str()];

        self.requests_total
            .get_metric_with_label_values(&labels)?
            .inc();
        self.response_time_seconds
            .get_metric_with_label_values(&labels)?
            .observe(duration_secs);
        Ok(())
    }

    fn record_memory_usage(&self, bytes: u64) -> Result<(), MetricsError> {
        let value = i64::try_from(bytes).map_err(|_| MetricsError::OutOfRange {
            metric: "app_memory_usage_bytes",
            value: bytes,
        })?;
        self.memory_usage_bytes.set(value);
        Ok(())
    }

    fn record_error(&self, error_type: &str) -> Result<(), MetricsError> {
        self.errors_total
            .get_metric_with_label_values(&[error_type])?
            .inc();
        Ok(())
    }

    fn set_active_users(&self, count: i64) -> Result<(), MetricsError> {
        self.active_users.set(count);
        Ok(())
    }
}
