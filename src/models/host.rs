// Host listing models (server read side) and the overload threshold flags.

use serde::{Deserialize, Serialize};

/// Percent above which CPU (used or iowait) flags a host.
pub const CPU_THRESHOLD_PCT: i64 = 80;
/// Percent above which memory (ram or swap) flags a host.
pub const MEM_THRESHOLD_PCT: i64 = 80;
/// Percent above which disk (space or inodes) flags a host.
pub const DISK_THRESHOLD_PCT: i64 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub code: String,
    pub name: String,
}

impl ProjectEntry {
    pub fn new(code: String) -> Self {
        let name = code.to_uppercase();
        Self { code, name }
    }
}

/// Minimal host identity used to resolve a metric query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRef {
    pub id: i64,
    pub code: String,
    pub project: String,
    pub cpu_processors: i64,
}

/// Joined row from the store: static facts plus the latest metric values.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRow {
    pub id: i64,
    pub code: String,
    pub hostname: String,
    pub alias: Option<String>,
    pub ip: String,
    pub os_type: String,
    pub architecture: String,
    pub cpu_processors: i64,
    pub mem_size: i64,
    pub disk_size: i64,
    pub uptime: f64,
    pub heartbeat_time: i64,
    pub project: String,
    pub loadavg_1m: f64,
    pub loadavg_5m: f64,
    pub loadavg_15m: f64,
    pub cpu_used: f64,
    pub cpu_iowait: f64,
    pub mem_used: f64,
    pub swap_used: f64,
    pub disk_used: f64,
    pub inode_used: f64,
    pub users: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSummary {
    pub id: i64,
    pub code: String,
    pub hostname: String,
    pub alias: String,
    pub ip: String,
    pub ips: Vec<String>,
    pub os_type: String,
    pub architecture: String,
    pub cpu_processors: i64,
    pub mem_size: i64,
    pub disk_size: i64,
    pub uptime: f64,
    pub heartbeat_time: i64,
    /// `"1m, 5m, 15m"` with 2 decimals each.
    pub loadavg: String,
    pub cpu_usage: i64,
    pub mem_usage: i64,
    pub disk_usage: i64,
    pub users: i64,
    pub project: String,
    pub max_loadavg: f64,
    pub is_overload: bool,
    pub is_overcpu: bool,
    pub is_overmem: bool,
    pub is_overdisk: bool,
}

impl From<HostRow> for HostSummary {
    fn from(row: HostRow) -> Self {
        let max_loadavg = row.loadavg_1m.max(row.loadavg_5m).max(row.loadavg_15m).max(0.0);
        // Truncation toward zero matches what the dashboard has always shown.
        let cpu_usage = row.cpu_used.max(row.cpu_iowait) as i64;
        let mem_usage = row.mem_used.max(row.swap_used) as i64;
        let disk_usage = row.disk_used.max(row.inode_used) as i64;
        let ips = row
            .ip
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        HostSummary {
            id: row.id,
            code: row.code,
            hostname: row.hostname,
            alias: row.alias.unwrap_or_default(),
            ip: row.ip,
            ips,
            os_type: row.os_type,
            architecture: row.architecture,
            cpu_processors: row.cpu_processors,
            mem_size: row.mem_size,
            disk_size: row.disk_size,
            uptime: row.uptime,
            heartbeat_time: row.heartbeat_time,
            loadavg: format!(
                "{:.2}, {:.2}, {:.2}",
                row.loadavg_1m, row.loadavg_5m, row.loadavg_15m
            ),
            cpu_usage,
            mem_usage,
            disk_usage,
            users: row.users,
            project: row.project,
            max_loadavg,
            is_overload: max_loadavg > row.cpu_processors as f64,
            is_overcpu: cpu_usage > CPU_THRESHOLD_PCT,
            is_overmem: mem_usage > MEM_THRESHOLD_PCT,
            is_overdisk: disk_usage > DISK_THRESHOLD_PCT,
        }
    }
}
