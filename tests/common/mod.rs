// Shared test helpers: fixture proc roots and sample records
#![allow(dead_code)]

use std::path::Path;

use hostmon::models::{HostMetricSnapshot, HostReport};
use hostmon::snapshot::host_code;
use tempfile::TempDir;

pub const STAT: &str = "cpu  100 0 50 800 50 0 0 0 0 0
cpu0 50 0 25 400 25 0 0 0 0 0
cpu1 50 0 25 400 25 0 0 0 0 0
intr 12345
ctxt 67890
";

pub const DISKSTATS: &str = "   7       0 loop0 10 0 80 1 0 0 0 0 0 1 1 0 0 0 0
   8       0 sda 100 5 2048 10 200 7 4096 20 3 30 40 0 0 0 0
   8       1 sda1 90 5 1024 9 190 7 2048 19 1 29 39 0 0 0 0
 253       0 dm-0 50 0 512 5 60 0 640 6 0 11 11 0 0 0 0
 259       0 nvme0n1 70 0 700 7 80 0 800 8 0 15 15 0 0 0 0
";

pub const NET_DEV: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 9999999    9999    0    0    0     0          0         0  9999999    9999    0    0    0     0       0          0
  eth0: 1048576    1000    0    0    0     0          0         0   524288     500    0    0    0     0       0          0
  eth1:    2048      20    0    0    0     0          0         0     1024      10    0    0    0     0       0          0
";

pub const MEMINFO: &str = "MemTotal:        8388608 kB
MemFree:         2097152 kB
MemAvailable:    4194304 kB
Buffers:          524288 kB
Cached:          1572864 kB
SwapCached:            0 kB
SwapTotal:       2097152 kB
SwapFree:        1048576 kB
";

pub const LOADAVG: &str = "0.52 0.48 0.41 2/345 12345\n";
pub const UPTIME: &str = "172800.00 345000.00\n";

pub const SOCKSTAT: &str = "sockets: used 300
TCP: inuse 12 orphan 0 tw 7 alloc 20 mem 3
UDP: inuse 4 mem 2
";

pub const SOCKSTAT6: &str = "TCP6: inuse 3
UDP6: inuse 1
";

pub const CPUINFO: &str = "processor\t: 0
model name\t: Test CPU
flags\t\t: fpu vme

processor\t: 1
model name\t: Test CPU
flags\t\t: fpu vme
";

pub const MOUNTS: &str = "/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid 0 0
/dev/loop0 /snap/core squashfs ro 0 0
tmpfs /run tmpfs rw 0 0
";

pub const OS_RELEASE: &str = "NAME=\"Debian GNU/Linux\"
PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"
ID=debian
";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// A temporary directory laid out like `/` with every counter source populated.
pub struct ProcFixture {
    pub dir: TempDir,
}

impl ProcFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "proc/stat", STAT);
        write(root, "proc/diskstats", DISKSTATS);
        write(root, "proc/net/dev", NET_DEV);
        write(root, "proc/meminfo", MEMINFO);
        write(root, "proc/loadavg", LOADAVG);
        write(root, "proc/uptime", UPTIME);
        write(root, "proc/net/sockstat", SOCKSTAT);
        write(root, "proc/net/sockstat6", SOCKSTAT6);
        write(root, "proc/cpuinfo", CPUINFO);
        write(root, "proc/mounts", MOUNTS);
        write(root, "etc/os-release", OS_RELEASE);
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn set(&self, rel: &str, content: &str) {
        write(self.root(), rel, content);
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.root().join(rel)).unwrap();
    }
}

pub fn sample_snapshot(hostname: &str, project: &str, heartbeat_time: i64) -> HostMetricSnapshot {
    HostMetricSnapshot {
        code: host_code(hostname),
        hostname: hostname.into(),
        ip: "10.0.0.5".into(),
        project: project.into(),
        heartbeat_time,
        loadavg_1m: 0.5,
        loadavg_5m: 0.4,
        loadavg_15m: 0.3,
        cpu_used: 12.5,
        cpu_iowait: 1.25,
        mem_used: 40.0,
        swap_used: 5.0,
        disk_usage: "/_40_30.00_2.00,/data_100_50.00_10.00".into(),
        disk_used: 50.0,
        inode_used: 10.0,
        disk_read_rate: 12.0,
        disk_write_rate: 34.0,
        disk_ios: 2,
        nic_receive_rate: 56.0,
        nic_receive_packets: 100,
        nic_transmit_rate: 78.0,
        nic_transmit_packets: 90,
        tcp_sockets_inuse: 15,
        tcp_sockets_tw: 7,
        users: 2,
    }
}

pub fn sample_host_report(hostname: &str, project: &str) -> HostReport {
    HostReport {
        code: host_code(hostname),
        hostname: hostname.into(),
        ip: "10.0.0.5".into(),
        os_type: "Debian GNU/Linux 12 (bookworm)".into(),
        architecture: "64-bit 6.1.0 x86_64".into(),
        cpu_processors: 4,
        mem_size: 8,
        swap_size: 2,
        disk_size: 140,
        uptime: 2.0,
        heartbeat_time: 1_700_000_000_000,
        project: project.into(),
        version: "0.3.0".into(),
    }
}
