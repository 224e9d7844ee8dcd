//! Periodic reconciliation task

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use super::synchronizer::NacosSynchronizer;

/// Spawn the reconciliation loop
///
/// The first pass runs after `initial_delay`, then every `interval`. A pass
/// that overruns the interval delays the next tick instead of bursting.
/// The loop exits when `shutdown` flips to `true` (or its sender is dropped)
/// and releases the synchronizer's cached clients on the way out.
pub fn start_sync_scheduler(
    synchronizer: Arc<NacosSynchronizer>,
    interval: Duration,
    initial_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval = %humantime::format_duration(interval),
            initial_delay = %humantime::format_duration(initial_delay),
            "Nacos sync scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match synchronizer.sync_all().await {
                        Ok(summary) if summary.failed > 0 => {
                            warn!(synced = summary.synced, failed = summary.failed, "Nacos sync pass finished with failures");
                        }
                        Ok(summary) => {
                            info!(synced = summary.synced, "Nacos sync pass finished");
                        }
                        Err(e) => {
                            error!("Failed to run Nacos sync pass: {}", e);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        synchronizer.shutdown();
        info!("Nacos sync scheduler stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncSettings;
    use sqlx::PgPool;

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_stops_on_shutdown_before_first_tick() {
        let pool = PgPool::connect_lazy("postgresql://test").unwrap();
        let synchronizer = Arc::new(NacosSynchronizer::new(pool, SyncSettings::default()));
        let (tx, rx) = watch::channel(false);

        let handle = start_sync_scheduler(
            synchronizer,
            Duration::from_secs(60),
            Duration::from_secs(3600),
            rx,
        );

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
