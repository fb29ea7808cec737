// Flat metric rows -> chart series, plus the query window arithmetic.

use std::collections::BTreeMap;

use crate::models::{DiskUsageDecodeError, HostMetricSnapshot, Series, SeriesSet, disk_usage};

pub const DEFAULT_OFFSET_MINUTES: i64 = 240;
/// 31 days.
pub const DEFAULT_LIMIT_MINUTES: i64 = 44_640;

const MINUTE_MS: i64 = 60_000;

/// Inclusive `[begin, end]` window in unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub begin: i64,
    pub end: i64,
}

impl QueryWindow {
    /// `offset` minutes back from `now_ms` is the start; `limit` minutes is the width.
    /// A `limit` of -1, or one reaching past now, ends the window at `now_ms`.
    /// `None` when the bounds do not fit in unix milliseconds.
    pub fn from_offset_limit(now_ms: i64, offset: i64, limit: i64) -> Option<Self> {
        let begin = now_ms.checked_sub(offset.checked_mul(MINUTE_MS)?)?;
        let end = if limit == -1 || offset <= limit {
            now_ms
        } else {
            now_ms.checked_sub(offset.checked_sub(limit)?.checked_mul(MINUTE_MS)?)?
        };
        Some(Self { begin, end })
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.begin && ts <= self.end
    }
}

/// Rows must already be in ascending `heartbeat_time` order.
pub fn reshape(rows: &[HostMetricSnapshot]) -> Result<SeriesSet, DiskUsageDecodeError> {
    let n = rows.len();
    let col = |f: fn(&HostMetricSnapshot) -> f64| -> Vec<f64> { rows.iter().map(f).collect() };

    let mut disk: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut inode: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        for usage in disk_usage::last_per_mount(disk_usage::decode(&row.disk_usage)?) {
            disk.entry(usage.disk_series_name())
                .or_insert_with(|| Vec::with_capacity(n))
                .push(usage.disk_used_pct);
            inode
                .entry(usage.inode_series_name())
                .or_insert_with(|| Vec::with_capacity(n))
                .push(usage.inode_used_pct);
        }
    }

    let disk_usage = disk
        .into_iter()
        .chain(inode)
        .map(|(name, data)| Series::new(name, data))
        .collect();

    Ok(SeriesSet {
        loadavg: vec![
            Series::new("loadavg_1m", col(|r| r.loadavg_1m)),
            Series::new("loadavg_5m", col(|r| r.loadavg_5m)),
            Series::new("loadavg_15m", col(|r| r.loadavg_15m)),
        ],
        cpu_usage: vec![
            Series::new("cpu_usage", col(|r| r.cpu_used)),
            Series::new("cpu_iowait", col(|r| r.cpu_iowait)),
        ],
        mem_usage: vec![
            Series::new("mem_usage", col(|r| r.mem_used)),
            Series::new("swap_usage", col(|r| r.swap_used)),
        ],
        disk_usage,
        disk_io_rate: vec![
            Series::new("read_rate", col(|r| r.disk_read_rate)),
            Series::new("write_rate", col(|r| r.disk_write_rate)),
        ],
        nic_io_rate: vec![
            Series::new("receive_rate", col(|r| r.nic_receive_rate)),
            Series::new("transmit_rate", col(|r| r.nic_transmit_rate)),
        ],
        tcp_sockets: vec![
            Series::new("inuse", col(|r| r.tcp_sockets_inuse as f64)),
            Series::new("tw", col(|r| r.tcp_sockets_tw as f64)),
        ],
        misc: vec![Series::new("users", col(|r| r.users as f64))],
        timestamps: rows.iter().map(|r| r.heartbeat_time).collect(),
    })
}
