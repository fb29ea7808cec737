// Wire records posted by the agent. Field names are snake_case to match deployed agents.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::disk_usage;

static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{1,32}$").expect("static project pattern"));

static HOST_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{32,64}$").expect("static host code pattern"));

pub const DEFAULT_PROJECT: &str = "default";

/// One metrics record per host per cycle; immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMetricSnapshot {
    pub code: String,
    pub hostname: String,
    pub ip: String,
    pub project: String,
    /// Unix milliseconds.
    pub heartbeat_time: i64,
    pub loadavg_1m: f64,
    pub loadavg_5m: f64,
    pub loadavg_15m: f64,
    pub cpu_used: f64,
    pub cpu_iowait: f64,
    pub mem_used: f64,
    pub swap_used: f64,
    /// Encoded per-mount usage, see [`disk_usage::encode`].
    pub disk_usage: String,
    pub disk_used: f64,
    pub inode_used: f64,
    pub disk_read_rate: f64,
    pub disk_write_rate: f64,
    pub disk_ios: i64,
    pub nic_receive_rate: f64,
    pub nic_receive_packets: i64,
    pub nic_transmit_rate: f64,
    pub nic_transmit_packets: i64,
    pub tcp_sockets_inuse: i64,
    pub tcp_sockets_tw: i64,
    pub users: i64,
}

/// Static host facts, reported on a slower cadence than metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostReport {
    pub code: String,
    pub hostname: String,
    pub ip: String,
    pub os_type: String,
    pub architecture: String,
    pub cpu_processors: i64,
    /// GiB, rounded.
    pub mem_size: i64,
    /// GiB, rounded.
    pub swap_size: i64,
    /// GiB, rounded up.
    pub disk_size: i64,
    /// Days, 2 decimals.
    pub uptime: f64,
    pub heartbeat_time: i64,
    pub project: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("invalid project name {0:?}")]
    Project(String),
    #[error("invalid host code {0:?}")]
    Code(String),
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("disk_usage: {0}")]
    DiskUsage(String),
}

/// Lowercase and check a project name against the allow-list pattern.
pub fn normalize_project(raw: &str) -> Result<String, ValidationError> {
    let project = raw.trim().to_lowercase();
    if PROJECT_NAME.is_match(&project) {
        Ok(project)
    } else {
        Err(ValidationError::Project(raw.to_string()))
    }
}

fn check_code(code: &str) -> Result<(), ValidationError> {
    if HOST_CODE.is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::Code(code.to_string()))
    }
}

fn check_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(())
    }
}

fn check_finite(fields: &[(&'static str, f64)]) -> Result<(), ValidationError> {
    for (field, v) in fields {
        if !v.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
    }
    Ok(())
}

fn check_non_negative(fields: &[(&'static str, i64)]) -> Result<(), ValidationError> {
    for (field, v) in fields {
        if *v < 0 {
            return Err(ValidationError::Negative { field });
        }
    }
    Ok(())
}

impl HostMetricSnapshot {
    /// Boundary check before the record reaches storage; normalizes `project` in place.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_code(&self.code)?;
        check_non_empty("hostname", &self.hostname)?;
        self.project = normalize_project(&self.project)?;
        check_finite(&[
            ("loadavg_1m", self.loadavg_1m),
            ("loadavg_5m", self.loadavg_5m),
            ("loadavg_15m", self.loadavg_15m),
            ("cpu_used", self.cpu_used),
            ("cpu_iowait", self.cpu_iowait),
            ("mem_used", self.mem_used),
            ("swap_used", self.swap_used),
            ("disk_used", self.disk_used),
            ("inode_used", self.inode_used),
            ("disk_read_rate", self.disk_read_rate),
            ("disk_write_rate", self.disk_write_rate),
            ("nic_receive_rate", self.nic_receive_rate),
            ("nic_transmit_rate", self.nic_transmit_rate),
        ])?;
        check_non_negative(&[
            ("heartbeat_time", self.heartbeat_time),
            ("disk_ios", self.disk_ios),
            ("nic_receive_packets", self.nic_receive_packets),
            ("nic_transmit_packets", self.nic_transmit_packets),
            ("tcp_sockets_inuse", self.tcp_sockets_inuse),
            ("tcp_sockets_tw", self.tcp_sockets_tw),
            ("users", self.users),
        ])?;
        disk_usage::decode(&self.disk_usage)
            .map_err(|e| ValidationError::DiskUsage(e.to_string()))?;
        Ok(())
    }
}

impl HostReport {
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_code(&self.code)?;
        check_non_empty("hostname", &self.hostname)?;
        check_non_empty("version", &self.version)?;
        self.project = normalize_project(&self.project)?;
        check_finite(&[("uptime", self.uptime)])?;
        check_non_negative(&[
            ("cpu_processors", self.cpu_processors),
            ("mem_size", self.mem_size),
            ("swap_size", self.swap_size),
            ("disk_size", self.disk_size),
            ("heartbeat_time", self.heartbeat_time),
        ])?;
        Ok(())
    }
}
