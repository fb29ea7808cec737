use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::models::normalize_project;

fn config_path(default: &str) -> String {
    std::env::var("CONFIG_FILE").unwrap_or_else(|_| default.into())
}

// ---------- agent ----------

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub agent: AgentSection,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// Base URL of the server API, e.g. `http://monitor:8080/api`.
    pub api_url: String,
    #[serde(default = "default_project")]
    pub project: String,
    pub token: String,
    #[serde(default = "default_metric_interval_secs")]
    pub metric_interval_secs: u64,
    #[serde(default = "default_host_interval_secs")]
    pub host_interval_secs: u64,
}

fn default_project() -> String {
    crate::models::DEFAULT_PROJECT.into()
}

fn default_metric_interval_secs() -> u64 {
    60
}

fn default_host_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Gap between the two counter reads of a rate sample.
    #[serde(default = "default_sampling_interval_ms")]
    pub interval_ms: u64,
    /// Prefix for /proc and /etc paths.
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sampling_interval_ms(),
            proc_root: default_proc_root(),
        }
    }
}

fn default_sampling_interval_ms() -> u64 {
    crate::sampler::DEFAULT_SAMPLE_INTERVAL.as_millis() as u64
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/")
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl AgentConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path("agent.toml");
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let mut config: AgentConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.agent.api_url.starts_with("http://") || self.agent.api_url.starts_with("https://"),
            "agent.api_url must be an http(s) URL, got {:?}",
            self.agent.api_url
        );
        anyhow::ensure!(!self.agent.token.is_empty(), "agent.token must be non-empty");
        self.agent.project = normalize_project(&self.agent.project)
            .map_err(|e| anyhow::anyhow!("agent.project: {}", e))?;
        anyhow::ensure!(
            self.agent.metric_interval_secs > 0,
            "agent.metric_interval_secs must be > 0, got {}",
            self.agent.metric_interval_secs
        );
        anyhow::ensure!(
            self.agent.host_interval_secs > 0,
            "agent.host_interval_secs must be > 0, got {}",
            self.agent.host_interval_secs
        );
        anyhow::ensure!(
            self.sampling.interval_ms > 0,
            "sampling.interval_ms must be > 0, got {}",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            self.sampling.interval_ms < self.agent.metric_interval_secs.saturating_mul(1000),
            "sampling.interval_ms must be shorter than agent.metric_interval_secs, got {}ms",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            self.http.request_timeout_secs > 0,
            "http.request_timeout_secs must be > 0, got {}",
            self.http.request_timeout_secs
        );
        Ok(())
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling.interval_ms)
    }
}

// ---------- server ----------

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    pub port: u16,
    pub host: String,
    /// Shared secret expected in the `token` header of report requests.
    pub token: String,
    #[serde(default = "default_gzip")]
    pub gzip: bool,
}

fn default_gzip() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

fn default_retention_days() -> u32 {
    31
}

fn default_prune_interval_secs() -> u64 {
    3600
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path("server.toml");
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.token.is_empty(), "server.token must be non-empty");
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.database.prune_interval_secs > 0,
            "database.prune_interval_secs must be > 0, got {}",
            self.database.prune_interval_secs
        );
        Ok(())
    }
}
