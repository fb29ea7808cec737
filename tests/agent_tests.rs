// Snapshot builder, reporter and agent workers against a live local server

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ProcFixture, sample_host_report};
use hostmon::agent::{self, AgentDeps, AgentIntervals};
use hostmon::config::ServerConfig;
use hostmon::counters::CounterReader;
use hostmon::history_repo::HistoryRepo;
use hostmon::reporter::{ReportError, Reporter};
use hostmon::routes;
use hostmon::sampler::Sampler;
use hostmon::snapshot::{HostIdentity, SnapshotBuilder, host_code};
use tempfile::TempDir;

const SERVER_CONFIG: &str = r#"
[server]
port = 8081
host = "127.0.0.1"
token = "s3cret"

[database]
path = "unused.db"
max_pool_size = 2
"#;

/// Serves the real router on an ephemeral port. Returns `http://addr/api`.
async fn spawn_server(dir: &TempDir) -> (String, Arc<HistoryRepo>) {
    let path = dir.path().join("server.db");
    let repo = Arc::new(
        HistoryRepo::connect(path.to_str().unwrap(), 2, 31)
            .await
            .unwrap(),
    );
    repo.init().await.unwrap();
    let app = routes::app(repo.clone(), ServerConfig::load_from_str(SERVER_CONFIG).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), repo)
}

fn fixture_builder(fx: &ProcFixture) -> SnapshotBuilder {
    let sampler = Sampler::new(CounterReader::new(fx.root()), Duration::from_millis(10));
    SnapshotBuilder::new(sampler, "default")
        .with_identity(HostIdentity::new("fixture-host", "10.1.2.3").unwrap())
}

#[test]
fn identity_requires_hostname() {
    assert!(HostIdentity::new("  ", "").is_err());
    let id = HostIdentity::new("web-1", "10.0.0.1").unwrap();
    assert_eq!(id.code, host_code("web-1"));
}

#[test]
fn build_host_from_fixture_root() {
    let fx = ProcFixture::new();
    let mut report = fixture_builder(&fx).build_host().unwrap();
    assert_eq!(report.hostname, "fixture-host");
    assert_eq!(report.code, host_code("fixture-host"));
    assert_eq!(report.ip, "10.1.2.3");
    assert_eq!(report.os_type, "Debian GNU/Linux 12 (bookworm)");
    assert_eq!(report.cpu_processors, 2);
    assert_eq!(report.mem_size, 8);
    assert_eq!(report.swap_size, 2);
    assert_eq!(report.uptime, 2.0);
    assert_eq!(report.version, hostmon::version::VERSION);
    assert!(report.architecture.contains("-bit "));
    assert!(report.validate().is_ok());
}

#[test]
fn build_host_is_all_or_nothing() {
    let fx = ProcFixture::new();
    fx.remove("proc/cpuinfo");
    assert!(fixture_builder(&fx).build_host().is_err());
}

#[test]
fn build_metric_fails_without_partial_output() {
    let fx = ProcFixture::new();
    fx.remove("proc/loadavg");
    assert!(fixture_builder(&fx).build_metric().is_err());
}

#[tokio::test]
async fn reporter_posts_host_report() {
    let dir = TempDir::new().unwrap();
    let (api, repo) = spawn_server(&dir).await;
    let reporter = Reporter::new(api, "s3cret", Duration::from_secs(5)).unwrap();

    reporter
        .post_host(&sample_host_report("web-1", "default"))
        .await
        .unwrap();
    let hosts = repo.list_hosts("default").await.unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].hostname, "web-1");
}

#[tokio::test]
async fn reporter_surfaces_non_2xx_status() {
    let dir = TempDir::new().unwrap();
    let (api, _repo) = spawn_server(&dir).await;
    let reporter = Reporter::new(api, "wrong", Duration::from_secs(5)).unwrap();

    let err = reporter
        .post_host(&sample_host_report("web-1", "default"))
        .await
        .unwrap_err();
    match err {
        ReportError::Status { status, .. } => assert_eq!(status.as_u16(), 401),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn reporter_transport_error_when_server_is_down() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let reporter = Reporter::new(
        format!("http://{}/api/", addr),
        "s3cret",
        Duration::from_secs(2),
    )
    .unwrap();
    assert_eq!(
        reporter.endpoint("report_host"),
        format!("http://{}/api/report_host", addr)
    );
    let err = reporter
        .post_host(&sample_host_report("web-1", "default"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::Transport { .. }));
}

#[tokio::test]
async fn host_cycle_delivers_fixture_report() {
    let dir = TempDir::new().unwrap();
    let (api, repo) = spawn_server(&dir).await;
    let fx = ProcFixture::new();
    let builder = Arc::new(fixture_builder(&fx));
    let reporter = Reporter::new(api, "s3cret", Duration::from_secs(5)).unwrap();

    assert!(agent::host_cycle(&builder, &reporter).await);
    let hosts = repo.list_hosts("default").await.unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].code, host_code("fixture-host"));
    assert_eq!(hosts[0].os_type, "Debian GNU/Linux 12 (bookworm)");
}

#[tokio::test]
async fn failed_cycle_is_logged_not_fatal() {
    let dir = TempDir::new().unwrap();
    let (api, repo) = spawn_server(&dir).await;
    let fx = ProcFixture::new();
    fx.remove("proc/stat");
    let builder = Arc::new(fixture_builder(&fx));
    let reporter = Reporter::new(api, "s3cret", Duration::from_secs(5)).unwrap();

    assert!(!agent::metric_cycle(&builder, &reporter).await);
    assert!(repo.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn workers_tick_and_stop_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let (api, repo) = spawn_server(&dir).await;
    let fx = ProcFixture::new();
    let builder = Arc::new(fixture_builder(&fx));
    let reporter = Arc::new(Reporter::new(api, "s3cret", Duration::from_secs(5)).unwrap());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let (host_handle, metric_handle) = agent::spawn(
        AgentDeps {
            builder,
            reporter,
            shutdown_rx,
        },
        AgentIntervals {
            host_interval_secs: 3600,
            metric_interval_secs: 3600,
        },
    );

    // The first tick fires immediately; give the host cycle time to land.
    let mut delivered = false;
    for _ in 0..50 {
        if !repo.list_hosts("default").await.unwrap().is_empty() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(delivered, "host worker should deliver on its first tick");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), host_handle)
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), metric_handle)
        .await
        .unwrap()
        .unwrap();
}
