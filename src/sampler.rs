// Delta metrics over a fixed window plus the single-read usage metrics.
//
// `sample_rates` reads CPU, disk and NIC counters at t0, sleeps for the configured
// interval on the calling thread, then reads them again at t1. Callers on an async
// runtime run it under `spawn_blocking`.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{instrument, warn};

use crate::counters::{
    CollectError, CounterReader, CpuTimes, DiskIoCounters, FsStats, MemInfo, MountEntry,
    NicCounters,
};
use crate::models::DiskUsage;
use crate::models::disk_usage::is_encodable_mount;
use crate::units::{GIB, KIB, SECTOR_BYTES, percent, round2};

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuUsage {
    pub used_pct: f64,
    pub iowait_pct: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskIoRate {
    pub read_kib_per_sec: f64,
    pub write_kib_per_sec: f64,
    /// Field-12 counter as read at t1.
    pub ios: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NicIoRate {
    pub rx_kib_per_sec: f64,
    pub rx_packets: u64,
    pub tx_kib_per_sec: f64,
    pub tx_packets: u64,
}

/// Every rate metric from one t0/t1 window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateSample {
    pub cpu: CpuUsage,
    pub disk: DiskIoRate,
    pub nic: NicIoRate,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUsage {
    pub mem_used_pct: f64,
    pub swap_used_pct: f64,
}

/// Per-mount usage plus the maxima used for the host summary flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MountUsage {
    pub mounts: Vec<DiskUsage>,
    pub max_disk_used_pct: f64,
    pub max_inode_used_pct: f64,
}

/// Field-wise `t1 - t0`; a counter that went backwards contributes 0.
fn cpu_delta(t0: &CpuTimes, t1: &CpuTimes) -> CpuTimes {
    CpuTimes {
        user: t1.user.saturating_sub(t0.user),
        nice: t1.nice.saturating_sub(t0.nice),
        system: t1.system.saturating_sub(t0.system),
        idle: t1.idle.saturating_sub(t0.idle),
        iowait: t1.iowait.saturating_sub(t0.iowait),
        irq: t1.irq.saturating_sub(t0.irq),
        softirq: t1.softirq.saturating_sub(t0.softirq),
    }
}

pub fn cpu_usage(t0: &CpuTimes, t1: &CpuTimes) -> CpuUsage {
    let d = cpu_delta(t0, t1);
    let total = d.total();
    if total == 0 {
        warn!(
            operation = "cpu_usage",
            "cpu total jiffies did not advance; reporting 0%"
        );
        return CpuUsage::default();
    }
    let total = total as f64;
    CpuUsage {
        used_pct: round2(percent(d.used() as f64, total).clamp(0.0, 100.0)),
        iowait_pct: round2(percent(d.iowait as f64, total).clamp(0.0, 100.0)),
    }
}

/// `delta / elapsed_secs / 1024`, or 0 (with a warning) when no time elapsed.
fn kib_per_sec(delta_bytes: u64, elapsed: Duration, metric: &'static str) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        warn!(
            operation = "rate",
            metric, "zero elapsed time between counter reads; reporting 0"
        );
        return 0.0;
    }
    round2(delta_bytes as f64 / secs / KIB)
}

pub fn disk_io_rate(t0: &DiskIoCounters, t1: &DiskIoCounters, elapsed: Duration) -> DiskIoRate {
    let read = t1
        .sectors_read
        .saturating_sub(t0.sectors_read)
        .saturating_mul(SECTOR_BYTES);
    let written = t1
        .sectors_written
        .saturating_sub(t0.sectors_written)
        .saturating_mul(SECTOR_BYTES);
    DiskIoRate {
        read_kib_per_sec: kib_per_sec(read, elapsed, "disk_read_rate"),
        write_kib_per_sec: kib_per_sec(written, elapsed, "disk_write_rate"),
        ios: t1.ios,
    }
}

pub fn nic_io_rate(t0: &NicCounters, t1: &NicCounters, elapsed: Duration) -> NicIoRate {
    NicIoRate {
        rx_kib_per_sec: kib_per_sec(
            t1.rx_bytes.saturating_sub(t0.rx_bytes),
            elapsed,
            "nic_receive_rate",
        ),
        rx_packets: t1.rx_packets.saturating_sub(t0.rx_packets),
        tx_kib_per_sec: kib_per_sec(
            t1.tx_bytes.saturating_sub(t0.tx_bytes),
            elapsed,
            "nic_transmit_rate",
        ),
        tx_packets: t1.tx_packets.saturating_sub(t0.tx_packets),
    }
}

pub fn memory_usage(mem: &MemInfo) -> MemoryUsage {
    let mem_used = mem
        .mem_total
        .saturating_sub(mem.mem_free)
        .saturating_sub(mem.buffers)
        .saturating_sub(mem.cached);
    let swap_used = mem.swap_total.saturating_sub(mem.swap_free);
    if mem.mem_total == 0 {
        warn!(operation = "memory_usage", "MemTotal is 0; reporting 0%");
    }
    if mem.swap_total == 0 {
        warn!(operation = "memory_usage", "SwapTotal is 0; reporting 0%");
    }
    MemoryUsage {
        mem_used_pct: round2(percent(mem_used as f64, mem.mem_total as f64)),
        swap_used_pct: round2(percent(swap_used as f64, mem.swap_total as f64)),
    }
}

pub fn mount_usage(mount_point: &str, fs: &FsStats) -> DiskUsage {
    let total_bytes = fs.frsize as f64 * fs.blocks as f64;
    let used_blocks = fs.blocks.saturating_sub(fs.bfree);
    let used_inodes = fs.files.saturating_sub(fs.ffree);
    if fs.blocks == 0 {
        warn!(operation = "mount_usage", mount_point, "filesystem reports 0 blocks; reporting 0%");
    }
    if fs.files == 0 {
        warn!(operation = "mount_usage", mount_point, "filesystem reports 0 inodes; reporting 0%");
    }
    DiskUsage::new(
        mount_point,
        (total_bytes / GIB).round() as u64,
        percent(used_blocks as f64, fs.blocks as f64),
        percent(used_inodes as f64, fs.files as f64),
    )
}

#[derive(Debug, Clone)]
pub struct Sampler {
    reader: CounterReader,
    interval: Duration,
}

impl Sampler {
    pub fn new(reader: CounterReader, interval: Duration) -> Self {
        Self { reader, interval }
    }

    pub fn reader(&self) -> &CounterReader {
        &self.reader
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks the calling thread for `interval`.
    #[instrument(skip(self), fields(interval_ms = self.interval.as_millis() as u64))]
    pub fn sample_rates(&self) -> Result<RateSample, CollectError> {
        let cpu0 = self.reader.cpu_times()?;
        let disk0 = self.reader.disk_io()?;
        let nic0 = self.reader.nic()?;
        let t0 = Instant::now();

        std::thread::sleep(self.interval);

        let cpu1 = self.reader.cpu_times()?;
        let disk1 = self.reader.disk_io()?;
        let nic1 = self.reader.nic()?;
        let elapsed = t0.elapsed();

        Ok(RateSample {
            cpu: cpu_usage(&cpu0, &cpu1),
            disk: disk_io_rate(&disk0, &disk1, elapsed),
            nic: nic_io_rate(&nic0, &nic1, elapsed),
            elapsed,
        })
    }

    pub fn memory_usage(&self) -> Result<MemoryUsage, CollectError> {
        Ok(memory_usage(&self.reader.meminfo()?))
    }

    /// /proc/mounts lists stacked mounts bottom-up; only the last one at a path is visible.
    fn visible_mounts(&self) -> Result<Vec<MountEntry>, CollectError> {
        let mut entries = self.reader.mounts()?;
        let mut seen = HashSet::new();
        entries.reverse();
        entries.retain(|e| seen.insert(e.mount_point.clone()));
        entries.reverse();
        Ok(entries)
    }

    pub fn mount_usage(&self) -> Result<MountUsage, CollectError> {
        let mut out = MountUsage::default();
        for entry in self.visible_mounts()? {
            if !is_encodable_mount(&entry.mount_point) {
                warn!(
                    mount_point = %entry.mount_point,
                    "mount point contains the tuple separator; skipped"
                );
                continue;
            }
            let fs = self.reader.fs_stats(&entry.mount_point)?;
            let usage = mount_usage(&entry.mount_point, &fs);
            out.max_disk_used_pct = out.max_disk_used_pct.max(usage.disk_used_pct);
            out.max_inode_used_pct = out.max_inode_used_pct.max(usage.inode_used_pct);
            out.mounts.push(usage);
        }
        Ok(out)
    }

    /// Sum of `bsize * blocks` over real mounts, in GiB rounded up.
    pub fn disk_size_gib(&self) -> Result<u64, CollectError> {
        let mut bytes: u64 = 0;
        for entry in self.visible_mounts()? {
            let fs = self.reader.fs_stats(&entry.mount_point)?;
            bytes = bytes.saturating_add(fs.bsize.saturating_mul(fs.blocks));
        }
        Ok((bytes as f64 / GIB).ceil() as u64)
    }
}
