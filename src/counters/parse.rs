// Pure parsers for kernel counter sources. Each takes the full text of one source.
//
// Column positions follow Documentation/filesystems/proc.rst and
// Documentation/admin-guide/iostats.rst; they are load-bearing for existing fleets.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::error::CollectError;

/// Block devices counted for disk I/O. Whole disks and their partitions both match.
static DISK_DEVICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:sd[a-z]|sd[a-z][0-9]|vd[a-z]|vd[a-z][0-9]|xvd[a-z]|xvd[a-z][0-9]|hd[a-z]|hd[a-z][0-9])$")
        .expect("static disk device pattern")
});

/// First line of /proc/stat: aggregate jiffies across all CPUs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

impl CpuTimes {
    pub fn used(&self) -> u64 {
        self.user.saturating_add(self.nice).saturating_add(self.system)
    }

    pub fn total(&self) -> u64 {
        [self.idle, self.iowait, self.irq, self.softirq]
            .into_iter()
            .fold(self.used(), u64::saturating_add)
    }
}

/// Summed /proc/diskstats counters over every allow-listed device line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskIoCounters {
    pub sectors_read: u64,
    pub sectors_written: u64,
    /// Field 12 (1-based, major number = field 1).
    pub ios: u64,
}

/// Summed /proc/net/dev counters over every non-loopback interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NicCounters {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

/// The subset of /proc/meminfo used for usage percentages and sizes, in KiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpSockets {
    pub inuse: u64,
    pub tw: u64,
}

/// A /proc/mounts entry that passed the real-device filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
}

fn parse_u64(source: &'static str, field: &str, raw: &str) -> Result<u64, CollectError> {
    raw.parse::<u64>()
        .map_err(|e| CollectError::parse(source, format!("{field}: {raw:?}: {e}")))
}

fn parse_f64(source: &'static str, field: &str, raw: &str) -> Result<f64, CollectError> {
    raw.parse::<f64>()
        .map_err(|e| CollectError::parse(source, format!("{field}: {raw:?}: {e}")))
}

fn field<'a>(
    source: &'static str,
    fields: &[&'a str],
    index: usize,
) -> Result<&'a str, CollectError> {
    fields.get(index).copied().ok_or_else(|| {
        CollectError::parse(
            source,
            format!("expected at least {} fields, got {}", index + 1, fields.len()),
        )
    })
}

pub fn parse_cpu_times(content: &str) -> Result<CpuTimes, CollectError> {
    const SRC: &str = "/proc/stat";
    let line = content
        .lines()
        .next()
        .ok_or_else(|| CollectError::parse(SRC, "empty file"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if field(SRC, &fields, 0)? != "cpu" {
        return Err(CollectError::parse(SRC, "first line is not the aggregate cpu line"));
    }
    Ok(CpuTimes {
        user: parse_u64(SRC, "user", field(SRC, &fields, 1)?)?,
        nice: parse_u64(SRC, "nice", field(SRC, &fields, 2)?)?,
        system: parse_u64(SRC, "system", field(SRC, &fields, 3)?)?,
        idle: parse_u64(SRC, "idle", field(SRC, &fields, 4)?)?,
        iowait: parse_u64(SRC, "iowait", field(SRC, &fields, 5)?)?,
        irq: parse_u64(SRC, "irq", field(SRC, &fields, 6)?)?,
        softirq: parse_u64(SRC, "softirq", field(SRC, &fields, 7)?)?,
    })
}

pub fn is_counted_disk(device: &str) -> bool {
    DISK_DEVICE.is_match(device)
}

pub fn parse_diskstats(content: &str) -> Result<DiskIoCounters, CollectError> {
    const SRC: &str = "/proc/diskstats";
    let mut out = DiskIoCounters::default();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(device) = fields.get(2) else {
            continue;
        };
        if !is_counted_disk(device) {
            continue;
        }
        let read = parse_u64(SRC, "sectors read", field(SRC, &fields, 5)?)?;
        let written = parse_u64(SRC, "sectors written", field(SRC, &fields, 9)?)?;
        let ios = parse_u64(SRC, "ios", field(SRC, &fields, 11)?)?;
        out.sectors_read = out.sectors_read.saturating_add(read);
        out.sectors_written = out.sectors_written.saturating_add(written);
        out.ios = out.ios.saturating_add(ios);
    }
    Ok(out)
}

pub fn parse_net_dev(content: &str) -> Result<NicCounters, CollectError> {
    const SRC: &str = "/proc/net/dev";
    let mut out = NicCounters::default();
    for line in content.lines() {
        // Header lines carry no ':' separator after an interface name.
        let Some((iface, counters)) = line.split_once(':') else {
            continue;
        };
        let iface = iface.trim();
        if iface == "lo" || iface.contains('|') {
            continue;
        }
        let fields: Vec<&str> = counters.split_whitespace().collect();
        let rx_bytes = parse_u64(SRC, "receive bytes", field(SRC, &fields, 0)?)?;
        let rx_packets = parse_u64(SRC, "receive packets", field(SRC, &fields, 1)?)?;
        let tx_bytes = parse_u64(SRC, "transmit bytes", field(SRC, &fields, 8)?)?;
        let tx_packets = parse_u64(SRC, "transmit packets", field(SRC, &fields, 9)?)?;
        out.rx_bytes = out.rx_bytes.saturating_add(rx_bytes);
        out.rx_packets = out.rx_packets.saturating_add(rx_packets);
        out.tx_bytes = out.tx_bytes.saturating_add(tx_bytes);
        out.tx_packets = out.tx_packets.saturating_add(tx_packets);
    }
    Ok(out)
}

pub fn parse_meminfo(content: &str) -> Result<MemInfo, CollectError> {
    const SRC: &str = "/proc/meminfo";
    let mut values: HashMap<&str, &str> = HashMap::new();
    for line in content.lines() {
        if let Some((key, rest)) = line.split_once(':')
            && let Some(value) = rest.split_whitespace().next()
        {
            values.insert(key.trim(), value);
        }
    }
    let get = |key: &'static str| -> Result<u64, CollectError> {
        let raw = values
            .get(key)
            .ok_or_else(|| CollectError::parse(SRC, format!("missing {key}")))?;
        parse_u64(SRC, key, raw)
    };
    Ok(MemInfo {
        mem_total: get("MemTotal")?,
        mem_free: get("MemFree")?,
        buffers: get("Buffers")?,
        cached: get("Cached")?,
        swap_total: get("SwapTotal")?,
        swap_free: get("SwapFree")?,
    })
}

pub fn parse_loadavg(content: &str) -> Result<LoadAvg, CollectError> {
    const SRC: &str = "/proc/loadavg";
    let fields: Vec<&str> = content.split_whitespace().collect();
    Ok(LoadAvg {
        one: parse_f64(SRC, "1m", field(SRC, &fields, 0)?)?,
        five: parse_f64(SRC, "5m", field(SRC, &fields, 1)?)?,
        fifteen: parse_f64(SRC, "15m", field(SRC, &fields, 2)?)?,
    })
}

/// Seconds since boot.
pub fn parse_uptime(content: &str) -> Result<f64, CollectError> {
    const SRC: &str = "/proc/uptime";
    let fields: Vec<&str> = content.split_whitespace().collect();
    parse_f64(SRC, "uptime", field(SRC, &fields, 0)?)
}

/// `TCP: inuse N orphan N tw N alloc N mem N` from /proc/net/sockstat.
pub fn parse_sockstat(content: &str) -> Result<TcpSockets, CollectError> {
    const SRC: &str = "/proc/net/sockstat";
    let line = content
        .lines()
        .find(|l| l.starts_with("TCP:"))
        .ok_or_else(|| CollectError::parse(SRC, "missing TCP: line"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    Ok(TcpSockets {
        inuse: parse_u64(SRC, "inuse", field(SRC, &fields, 2)?)?,
        tw: parse_u64(SRC, "tw", field(SRC, &fields, 6)?)?,
    })
}

/// In-use count from the `TCP6:` line of /proc/net/sockstat6.
pub fn parse_sockstat6(content: &str) -> Result<u64, CollectError> {
    const SRC: &str = "/proc/net/sockstat6";
    let line = content
        .lines()
        .find(|l| l.starts_with("TCP6:"))
        .ok_or_else(|| CollectError::parse(SRC, "missing TCP6: line"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    parse_u64(SRC, "inuse", field(SRC, &fields, 2)?)
}

pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter(|line| {
            line.starts_with("/dev")
                && !line.contains("/dev/loop")
                && !line.contains("chroot")
                && !line.contains("docker")
        })
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            Some(MountEntry {
                device: device.to_string(),
                mount_point: unescape_mount_path(mount_point),
            })
        })
        .collect()
}

/// /proc/mounts octal-escapes space, tab, newline and backslash in paths.
fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

pub fn count_processors(cpuinfo: &str) -> u64 {
    cpuinfo
        .lines()
        .filter(|l| l.starts_with("processor"))
        .count() as u64
}

/// `PRETTY_NAME` (or `NAME`) from os-release.
pub fn parse_os_release(content: &str) -> Option<String> {
    let lookup = |key: &str| {
        content.lines().find_map(|line| {
            let v = line.strip_prefix(key)?.trim().trim_matches('"');
            if v.is_empty() { None } else { Some(v.to_string()) }
        })
    };
    lookup("PRETTY_NAME=").or_else(|| lookup("NAME="))
}

/// First non-empty line of a release/issue file.
pub fn first_line(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Output of `users`: one name per login session.
pub fn count_users(output: &str) -> u64 {
    output.split_whitespace().count() as u64
}
