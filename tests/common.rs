#![allow(dead_code)]

use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use pulsemetrics::config::Config;
use pulsemetrics::metrics::Metrics;
use pulsemetrics::routes::create_router;
use pulsemetrics::state::AppState;
use serde::de::DeserializeOwned;

pub const TEST_CONFIG: &str = r#"
host: 127.0.0.1
port: 8081
logging:
  level: "debug"
  format: "json"
metrics:
  active_users_interval_secs: 1
  collect_process_metrics: false
"#;

pub fn load_test_config(yaml: &str) -> Config {
    Figment::new()
        .merge(Yaml::string(yaml))
        .extract()
        .expect("Failed to parse test config YAML")
}

pub fn build_app(config: Config) -> (Router, Metrics) {
    build_app_started_at(config, Instant::now())
}

pub fn build_app_started_at(config: Config, started_at: Instant) -> (Router, Metrics) {
    let metrics = Metrics::new().expect("metrics should register");
    let state = AppState::new(Arc::new(config), metrics.clone(), started_at);
    (create_router(state), metrics)
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let text = body_text(response).await;
    serde_json::from_str(&text).expect("body should be valid JSON")
}
