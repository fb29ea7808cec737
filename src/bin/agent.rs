use anyhow::Result;
use hostmon::*;
use std::sync::Arc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = config::AgentConfig::load()?;
    let reader = counters::CounterReader::new(config.sampling.proc_root.clone());
    let sampler = sampler::Sampler::new(reader, config.sampling_interval());
    let builder = Arc::new(snapshot::SnapshotBuilder::new(
        sampler,
        config.agent.project.clone(),
    ));
    let reporter = Arc::new(reporter::Reporter::new(
        config.agent.api_url.clone(),
        config.agent.token.clone(),
        Duration::from_secs(config.http.request_timeout_secs),
    )?);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let (host_handle, metric_handle) = agent::spawn(
        agent::AgentDeps {
            builder,
            reporter,
            shutdown_rx,
        },
        agent::AgentIntervals {
            host_interval_secs: config.agent.host_interval_secs,
            metric_interval_secs: config.agent.metric_interval_secs,
        },
    );
    tracing::info!(
        api_url = %config.agent.api_url,
        project = %config.agent.project,
        metric_interval_secs = config.agent.metric_interval_secs,
        host_interval_secs = config.agent.host_interval_secs,
        "Agent started"
    );

    logging::shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(true);
    let _ = host_handle.await;
    let _ = metric_handle.await;
    Ok(())
}
