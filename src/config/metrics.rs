use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings for the instrumentation layer and the synthetic signals.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between two updates of the `app_active_users` gauge.
    pub active_users_interval_secs: u64,
    /// Record every request that matched no route under a single label value
    /// instead of its raw path.
    pub collapse_unmatched_routes: bool,
    /// Register the process collector and `app_info` at startup.
    pub collect_process_metrics: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            active_users_interval_secs: 10,
            collapse_unmatched_routes: false,
            collect_process_metrics: true,
        }
    }
}

impl MetricsConfig {
    pub fn active_users_interval(&self) -> Duration {
        Duration::from_secs(self.active_users_interval_secs)
    }
}
