mod common;

use axum::http::StatusCode;
use chrono::DateTime;
use pulsemetrics::metrics::{METRICS_CONTENT_TYPE, UNMATCHED_ROUTE};
use pulsemetrics::routes::{
    HealthResponse, UsersResponse, ROOT_MESSAGE, SIMULATED_ERROR, SIMULATED_ERROR_MESSAGE,
};
use pulsemetrics::utils::http_helpers::ErrorBody;
use tower::ServiceExt;

use common::{
    body_json, body_text, build_app, build_app_started_at, get, load_test_config, TEST_CONFIG,
};

#[tokio::test]
async fn root_returns_single_static_message() {
    let (app, _metrics) = build_app(load_test_config(TEST_CONFIG));

    let response = app.oneshot(get("/")).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(body_text(response).await, ROOT_MESSAGE);
}

#[tokio::test]
async fn healthz_reports_status_timestamp_and_uptime() {
    let (app, _metrics) = build_app(load_test_config(TEST_CONFIG));

    let response = app
        .oneshot(get("/healthz"))
        .await
        .expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = body_json(response).await;
    assert_eq!(health.status, "OK");
    assert!(health.uptime >= 0.0);
    assert!(
        DateTime::parse_from_rfc3339(&health.timestamp).is_ok(),
        "timestamp should be ISO-8601, got {}",
        health.timestamp
    );
}

#[tokio::test]
async fn healthz_uptime_includes_time_before_the_router_existed() {
    let started_at = std::time::Instant::now();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let (app, _metrics) = build_app_started_at(load_test_config(TEST_CONFIG), started_at);

    let response = app
        .oneshot(get("/healthz"))
        .await
        .expect("request should succeed");

    let health: HealthResponse = body_json(response).await;
    assert!(health.uptime >= 0.05, "uptime {} should cover startup", health.uptime);
}

#[tokio::test]
async fn simulate_error_counts_each_call_once() {
    let (app, metrics) = build_app(load_test_config(TEST_CONFIG));

    for expected in 1..=3 {
        let response = app
            .clone()
            .oneshot(get("/simulate-error"))
            .await
            .expect("request should complete");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.error, SIMULATED_ERROR_MESSAGE);
        assert_eq!(metrics.error_count(SIMULATED_ERROR), expected);
    }
}

#[tokio::test]
async fn users_returns_value_in_range() {
    let (app, _metrics) = build_app(load_test_config(TEST_CONFIG));

    for _ in 0..50 {
        let response = app
            .clone()
            .oneshot(get("/users"))
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let users: UsersResponse = body_json(response).await;
        assert!((1..=100).contains(&users.active_users));
    }
}

#[tokio::test]
async fn users_does_not_touch_the_active_users_gauge() {
    let (app, metrics) = build_app(load_test_config(TEST_CONFIG));

    app.oneshot(get("/users")).await.expect("request should succeed");

    assert_eq!(metrics.active_users(), 0);
}

#[tokio::test]
async fn health_error_and_metrics_scenario() {
    let (app, _metrics) = build_app(load_test_config(TEST_CONFIG));

    let health = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let error = app.clone().oneshot(get("/simulate-error")).await.unwrap();
    assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        METRICS_CONTENT_TYPE
    );

    let text = body_text(response).await;
    assert!(text.contains("app_errors_total{error_type=\"simulated_error\"} 1"));
    assert!(text.contains(
        "app_requests_total{method=\"GET\",route=\"/healthz\",status_code=\"200\"} 1"
    ));
    assert!(text.contains(
        "app_requests_total{method=\"GET\",route=\"/simulate-error\",status_code=\"500\"} 1"
    ));
    assert!(text.contains("# TYPE app_response_time_seconds histogram"));
    assert!(text.contains(
        "app_response_time_seconds_bucket{method=\"GET\",route=\"/healthz\",status_code=\"200\",le=\"0.1\"} 1"
    ));
    assert!(text.contains(
        "app_response_time_seconds_count{method=\"GET\",route=\"/healthz\",status_code=\"200\"} 1"
    ));
}

#[tokio::test]
async fn request_counter_matches_prior_requests() {
    let (app, metrics) = build_app(load_test_config(TEST_CONFIG));

    for _ in 0..4 {
        app.clone().oneshot(get("/users")).await.unwrap();
    }
    for _ in 0..2 {
        app.clone().oneshot(get("/")).await.unwrap();
    }

    let text = body_text(app.clone().oneshot(get("/metrics")).await.unwrap()).await;
    assert!(text.contains(
        "app_requests_total{method=\"GET\",route=\"/users\",status_code=\"200\"} 4"
    ));
    assert!(text.contains("app_requests_total{method=\"GET\",route=\"/\",status_code=\"200\"} 2"));

    // The scrape itself is recorded once its response is complete.
    assert_eq!(metrics.request_count("GET", "/metrics", 200), 1);
}

#[tokio::test]
async fn non_get_methods_are_labelled_with_their_method() {
    let (app, metrics) = build_app(load_test_config(TEST_CONFIG));

    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri("/users")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(metrics.request_count("POST", "/users", 405), 1);
}

#[tokio::test]
async fn unknown_paths_are_404_and_still_counted() {
    let (app, metrics) = build_app(load_test_config(TEST_CONFIG));

    let response = app
        .oneshot(get("/admin/.env"))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.error, "Not found");
    assert_eq!(metrics.request_count("GET", "/admin/.env", 404), 1);
}

#[tokio::test]
async fn unknown_paths_collapse_when_configured() {
    let config = load_test_config(&format!(
        "{}\n  collapse_unmatched_routes: true\n",
        TEST_CONFIG.trim_end()
    ));
    let (app, metrics) = build_app(config);

    for path in ["/a", "/b", "/c"] {
        app.clone().oneshot(get(path)).await.unwrap();
    }

    assert_eq!(metrics.request_count("GET", UNMATCHED_ROUTE, 404), 3);
    assert_eq!(metrics.request_count("GET", "/a", 404), 0);
}

#[tokio::test]
async fn process_defaults_appear_in_the_scrape() {
    let (app, metrics) = build_app(load_test_config(TEST_CONFIG));
    metrics.collect_defaults().expect("defaults should register once");

    let text = body_text(app.oneshot(get("/metrics")).await.unwrap()).await;

    assert!(text.contains("# TYPE app_info gauge"));
    #[cfg(target_os = "linux")]
    assert!(text.contains("process_resident_memory_bytes"));
}
