// Agent workers: one task posts host facts, the other posts per-cycle metrics.
// Building runs on the blocking pool (the sampler sleeps); posting is async.
// A failed cycle is logged here and the next tick starts from scratch.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::counters::CollectError;
use crate::reporter::Reporter;
use crate::snapshot::SnapshotBuilder;

/// Builder, reporter and shutdown signal shared by both workers.
#[derive(Clone)]
pub struct AgentDeps {
    pub builder: Arc<SnapshotBuilder>,
    pub reporter: Arc<Reporter>,
    pub shutdown_rx: watch::Receiver<bool>,
}

pub struct AgentIntervals {
    pub host_interval_secs: u64,
    pub metric_interval_secs: u64,
}

/// Runs `build` on the blocking pool.
async fn build_blocking<T, F>(builder: &Arc<SnapshotBuilder>, build: F) -> Result<T, CollectError>
where
    T: Send + 'static,
    F: FnOnce(&SnapshotBuilder) -> Result<T, CollectError> + Send + 'static,
{
    let builder = builder.clone();
    tokio::task::spawn_blocking(move || build(&builder))
        .await
        .map_err(|e| CollectError::Join(e.to_string()))?
}

/// One host-report cycle. Returns whether the report was delivered.
pub async fn host_cycle(builder: &Arc<SnapshotBuilder>, reporter: &Reporter) -> bool {
    let report = match build_blocking(builder, |b| b.build_host()).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, operation = "build_host", "host report skipped");
            return false;
        }
    };
    match reporter.post_host(&report).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, operation = "post_host", "host report not delivered");
            false
        }
    }
}

/// One metric cycle. Returns whether the snapshot was delivered.
pub async fn metric_cycle(builder: &Arc<SnapshotBuilder>, reporter: &Reporter) -> bool {
    let snapshot = match build_blocking(builder, |b| b.build_metric()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, operation = "build_metric", "metric snapshot skipped");
            return false;
        }
    };
    match reporter.post_metric(&snapshot).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, operation = "post_metric", "metric snapshot not delivered");
            false
        }
    }
}

pub fn spawn_host_worker(deps: AgentDeps, every_secs: u64) -> tokio::task::JoinHandle<()> {
    let AgentDeps {
        builder,
        reporter,
        mut shutdown_rx,
    } = deps;
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(every_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if host_cycle(&builder, &reporter).await {
                        tracing::debug!(operation = "host_cycle", "host report delivered");
                    }
                }
                _ = shutdown_rx.changed() => {
                    tracing::debug!("Host worker shutting down");
                    break;
                }
            }
        }
    })
}

pub fn spawn_metric_worker(deps: AgentDeps, every_secs: u64) -> tokio::task::JoinHandle<()> {
    let AgentDeps {
        builder,
        reporter,
        mut shutdown_rx,
    } = deps;
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(every_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut delivered_total: u64 = 0;
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if metric_cycle(&builder, &reporter).await {
                        delivered_total += 1;
                        tracing::debug!(operation = "metric_cycle", delivered_total, "metric snapshot delivered");
                    }
                }
                _ = shutdown_rx.changed() => {
                    tracing::debug!(delivered_total, "Metric worker shutting down");
                    break;
                }
            }
        }
    })
}

/// Spawns both workers; they stop when `deps.shutdown_rx` flips or its sender is dropped.
pub fn spawn(
    deps: AgentDeps,
    intervals: AgentIntervals,
) -> (tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>) {
    let host = spawn_host_worker(deps.clone(), intervals.host_interval_secs);
    let metric = spawn_metric_worker(deps, intervals.metric_interval_secs);
    (host, metric)
}
