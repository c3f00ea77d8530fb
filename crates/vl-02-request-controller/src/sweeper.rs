//! Background deadline sweeper.
//!
//! Sweep granularity is the configured interval: a request is reclaimed at
//! most one interval after its deadline. Missed ticks are skipped.

use crate::controller::RequestController;
use shared_types::CorrelationId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Shortest interval the sweeper will tick at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Spawn a task that sweeps `controller` every `interval` and hands each
/// expired handler to `on_expired`.
///
/// The task exits when `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_sweeper<H, F>(
    controller: Arc<RequestController<H>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    on_expired: F,
) -> JoinHandle<()>
where
    H: Send + Sync + 'static,
    F: Fn(CorrelationId, H) + Send + 'static,
{
    let interval = interval.max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let expired = controller.sweep(Instant::now());
                    if !expired.is_empty() {
                        debug!(expired = expired.len(), "Swept expired pending requests");
                    }
                    for (correlation_id, handler) in expired {
                        on_expired(correlation_id, handler);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Request sweeper stopped");
    })
}
