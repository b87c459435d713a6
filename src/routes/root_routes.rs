//! Landing page.

use axum::{routing::get, Router};

use crate::state::AppState;

pub const ROOT_MESSAGE: &str = "Prometheus + Grafana + Kubernetes + NGINX - Monitoring System";

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(root))
}

async fn root() -> &'static str {
    ROOT_MESSAGE
}
