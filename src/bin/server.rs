use anyhow::Result;
use hostmon::*;
use std::sync::Arc;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = config::ServerConfig::load()?;
    let repo = Arc::new(
        history_repo::HistoryRepo::connect(
            &config.database.path,
            config.database.max_pool_size,
            config.database.retention_days,
        )
        .await?,
    );
    repo.init().await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let pruner_handle = pruner::spawn(
        repo.clone(),
        config.database.prune_interval_secs,
        shutdown_rx,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = routes::app(repo, config.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        gzip = config.server.gzip,
        retention_days = config.database.retention_days,
        "Listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(logging::shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = pruner_handle.await;
    Ok(())
}
