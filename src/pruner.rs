// Periodic retention pruning of host_metrics.

use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::history_repo::HistoryRepo;

pub fn spawn(
    repo: Arc<HistoryRepo>,
    prune_interval_secs: u64,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(prune_interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut rows_pruned_total: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match repo.prune_old_data().await {
                        Ok(n) => {
                            rows_pruned_total += n;
                            tracing::debug!(
                                operation = "prune_old_data",
                                rows_pruned = n,
                                rows_pruned_total,
                                "Old data pruned"
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                operation = "prune_old_data",
                                "Failed to prune old data"
                            );
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!(rows_pruned_total, "Pruner shutting down");
                    break;
                }
            }
        }
    })
}
