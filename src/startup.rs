//! Application startup and server initialization.
//!
//! This module handles the creation and configuration of the HTTP server,
//! including the metrics registry, the active users simulator and route setup.

use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::metrics::Metrics;
use crate::routes;
use crate::simulator::ActiveUsersSimulator;
use crate::state::AppState;

/// Initializes and runs the application server.
///
/// Builds the metrics registry, starts the active users simulator and serves
/// the configured routes until Ctrl-C or SIGTERM. The simulator is stopped
/// once the server has drained. `started_at` is the process start, reported
/// as uptime by `/healthz`.
///
/// # Errors
///
/// Returns an error if the metrics cannot be registered, the server fails to
/// bind to the configured address, or serving fails at runtime.
pub async fn run(
    config: Arc<Config>,
    started_at: Instant,
) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Metrics::new()?;
    if config.metrics.collect_process_metrics {
        metrics.collect_defaults()?;
    }

    let simulator = ActiveUsersSimulator::spawn(
        metrics.active_users_gauge(),
        config.metrics.active_users_interval(),
    );

    let state = AppState::new(config.clone(), metrics, started_at);
    let app = routes::create_router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!(
        event_name = "server.listening",
        event_domain = "server",
        address = address.as_str(),
        "listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    simulator.stop().await;
    served?;

    info!(
        event_name = "server.stopped",
        event_domain = "server",
        "server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        event_name = "server.shutdown.requested",
        event_domain = "server",
        "shutdown requested, draining connections"
    );
}
