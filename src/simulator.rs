//! Synthetic active users signal.
//!
//! There is no real source for this number. A background task overwrites the
//! `app_active_users` gauge with a fresh random draw on a fixed period.

use std::ops::RangeInclusive;
use std::time::Duration;

use prometheus::IntGauge;
use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, trace, warn};

pub const ACTIVE_USERS_RANGE: RangeInclusive<i64> = 1..=100;

/// Uniform draw from [`ACTIVE_USERS_RANGE`].
pub fn random_active_users() -> i64 {
    rand::thread_rng().gen_range(ACTIVE_USERS_RANGE)
}

pub struct ActiveUsersSimulator;

impl ActiveUsersSimulator {
    /// Starts the background task. The first update happens one `period`
    /// after the call, then every `period`.
    pub fn spawn(gauge: IntGauge, period: Duration) -> SimulatorHandle {
        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // Resolves on an explicit stop and when the handle is dropped.
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let active_users = random_active_users();
                        gauge.set(active_users);
                        trace!(
                            event_name = "simulator.active_users.updated",
                            event_domain = "simulator",
                            active_users,
                            "active users gauge updated"
                        );
                    }
                }
            }
        });

        info!(
            event_name = "simulator.started",
            event_domain = "simulator",
            period_secs = period.as_secs_f64(),
            "active users simulator started"
        );

        SimulatorHandle { shutdown_tx, task }
    }
}

/// Owner of the simulator task. Dropping it also ends the task.
pub struct SimulatorHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    /// Signals the task and waits for it to finish.
    pub async fn stop(self) {
        let SimulatorHandle { shutdown_tx, task } = self;
        // The task may already be gone, in which case there is nobody to notify.
        let _ = shutdown_tx.send(());
        if let Err(e) = task.await {
            warn!(
                event_name = "simulator.join.failed",
                event_domain = "simulator",
                error = %e,
                "active users simulator did not shut down cleanly"
            );
            return;
        }
        info!(
            event_name = "simulator.stopped",
            event_domain = "simulator",
            "active users simulator stopped"
        );
    }
}
