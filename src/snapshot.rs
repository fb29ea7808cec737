// Assembles HostMetricSnapshot and HostReport from the counter reader, the sampler
// and the host identity.
//
// Construction is all-or-nothing: the first failing accessor aborts the build and no
// partially filled record escapes.

use sha2::{Digest, Sha256};
use sysinfo::{Networks, System};
use tracing::instrument;

use crate::counters::CollectError;
use crate::models::{HostMetricSnapshot, HostReport, disk_usage};
use crate::sampler::Sampler;
use crate::units::{GIB, KIB, now_millis, round2};
use crate::version;

const SECS_PER_DAY: f64 = 86_400.0;

/// Stable host identity: SHA-256 hex digest of the hostname.
pub fn host_code(hostname: &str) -> String {
    hex::encode(Sha256::digest(hostname.as_bytes()))
}

/// Comma-joined, sorted list of non-loopback IPv4 addresses.
pub fn join_ips<I, S>(ips: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ips: Vec<String> = ips.into_iter().map(Into::into).collect();
    ips.sort();
    ips.dedup();
    ips.join(",")
}

/// `"<bits>-bit <kernel> <arch>"`, the shape `getconf LONG_BIT` + `uname -rm` produced.
pub fn architecture_label(kernel: &str, arch: &str) -> String {
    format!("{}-bit {} {}", usize::BITS, kernel, arch)
}

fn kib_to_gib(kib: u64) -> i64 {
    (kib as f64 * KIB / GIB).round() as i64
}

/// Hostname and addresses, resolved once per build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub hostname: String,
    pub code: String,
    pub ip: String,
}

impl HostIdentity {
    pub fn new(hostname: impl Into<String>, ip: impl Into<String>) -> Result<Self, CollectError> {
        let hostname = hostname.into();
        if hostname.trim().is_empty() {
            return Err(CollectError::Identity("empty hostname".into()));
        }
        Ok(Self {
            code: host_code(&hostname),
            hostname,
            ip: ip.into(),
        })
    }

    pub fn detect() -> Result<Self, CollectError> {
        let hostname = System::host_name()
            .ok_or_else(|| CollectError::Identity("hostname unavailable".into()))?;
        let networks = Networks::new_with_refreshed_list();
        let ips = networks
            .list()
            .values()
            .flat_map(|data| data.ip_networks().iter())
            .filter(|n| n.addr.is_ipv4() && !n.addr.is_loopback())
            .map(|n| n.addr.to_string());
        Self::new(hostname, join_ips(ips))
    }
}

/// Where the builder gets its identity from.
#[derive(Debug, Clone)]
enum IdentitySource {
    Detect,
    Fixed(HostIdentity),
}

#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    sampler: Sampler,
    project: String,
    identity: IdentitySource,
}

impl SnapshotBuilder {
    pub fn new(sampler: Sampler, project: impl Into<String>) -> Self {
        Self {
            sampler,
            project: project.into(),
            identity: IdentitySource::Detect,
        }
    }

    /// Pin the identity instead of resolving it from the running host.
    pub fn with_identity(mut self, identity: HostIdentity) -> Self {
        self.identity = IdentitySource::Fixed(identity);
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn identity(&self) -> Result<HostIdentity, CollectError> {
        match &self.identity {
            IdentitySource::Detect => HostIdentity::detect(),
            IdentitySource::Fixed(id) => Ok(id.clone()),
        }
    }

    /// Blocks for the sampling interval.
    #[instrument(skip(self), fields(operation = "build_metric", project = %self.project))]
    pub fn build_metric(&self) -> Result<HostMetricSnapshot, CollectError> {
        let identity = self.identity()?;
        let reader = self.sampler.reader();

        let rates = self.sampler.sample_rates()?;
        let load = reader.loadavg()?;
        let memory = self.sampler.memory_usage()?;
        let mounts = self.sampler.mount_usage()?;
        let sockets = reader.tcp_sockets()?;
        let users = reader.logged_in_users()?;

        Ok(HostMetricSnapshot {
            code: identity.code,
            hostname: identity.hostname,
            ip: identity.ip,
            project: self.project.clone(),
            heartbeat_time: now_millis(),
            loadavg_1m: load.one,
            loadavg_5m: load.five,
            loadavg_15m: load.fifteen,
            cpu_used: rates.cpu.used_pct,
            cpu_iowait: rates.cpu.iowait_pct,
            mem_used: memory.mem_used_pct,
            swap_used: memory.swap_used_pct,
            disk_usage: disk_usage::encode(&mounts.mounts),
            disk_used: round2(mounts.max_disk_used_pct),
            inode_used: round2(mounts.max_inode_used_pct),
            disk_read_rate: rates.disk.read_kib_per_sec,
            disk_write_rate: rates.disk.write_kib_per_sec,
            disk_ios: rates.disk.ios as i64,
            nic_receive_rate: rates.nic.rx_kib_per_sec,
            nic_receive_packets: rates.nic.rx_packets as i64,
            nic_transmit_rate: rates.nic.tx_kib_per_sec,
            nic_transmit_packets: rates.nic.tx_packets as i64,
            tcp_sockets_inuse: sockets.inuse as i64,
            tcp_sockets_tw: sockets.tw as i64,
            users: users as i64,
        })
    }

    #[instrument(skip(self), fields(operation = "build_host", project = %self.project))]
    pub fn build_host(&self) -> Result<HostReport, CollectError> {
        let identity = self.identity()?;
        let reader = self.sampler.reader();

        let mem = reader.meminfo()?;
        let kernel = System::kernel_version().unwrap_or_else(|| "unknown".into());

        Ok(HostReport {
            code: identity.code,
            hostname: identity.hostname,
            ip: identity.ip,
            os_type: reader.os_type()?,
            architecture: architecture_label(&kernel, &System::cpu_arch()),
            cpu_processors: reader.cpu_processors()? as i64,
            mem_size: kib_to_gib(mem.mem_total),
            swap_size: kib_to_gib(mem.swap_total),
            disk_size: self.sampler.disk_size_gib()? as i64,
            uptime: round2(reader.uptime_secs()? / SECS_PER_DAY),
            heartbeat_time: now_millis(),
            project: self.project.clone(),
            version: version::VERSION.to_string(),
        })
    }
}
