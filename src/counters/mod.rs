// Kernel counter sources: /proc, /etc release files, statvfs and `users`.
// Every accessor opens, reads and closes its own source; nothing is cached between calls.

mod error;
pub mod parse;
mod statfs;

pub use error::CollectError;
pub use parse::{
    CpuTimes, DiskIoCounters, LoadAvg, MemInfo, MountEntry, NicCounters, TcpSockets,
};
pub use statfs::FsStats;

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Release files tried in order for the OS type; the first that exists wins.
const RELEASE_FILES: [&str; 4] = [
    "etc/centos-release",
    "etc/redhat-release",
    "etc/os-release",
    "etc/issue",
];

/// Kill deadline for the `users` child.
pub const USERS_TIMEOUT: Duration = Duration::from_secs(10);
const CHILD_POLL: Duration = Duration::from_millis(20);

/// The command whose output lists one name per login session.
#[derive(Debug, Clone)]
pub struct UsersCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for UsersCommand {
    fn default() -> Self {
        Self {
            program: "users".into(),
            args: Vec::new(),
            timeout: USERS_TIMEOUT,
        }
    }
}

impl UsersCommand {
    fn error(&self, detail: impl Into<String>) -> CollectError {
        CollectError::Command {
            command: self.program.clone(),
            detail: detail.into(),
        }
    }

    /// Runs the command to completion, or kills it once `timeout` has passed.
    fn run(&self) -> Result<String, CollectError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.error(e.to_string()))?;

        let start = Instant::now();
        let status = loop {
            match child.try_wait().map_err(|e| self.error(e.to_string()))? {
                Some(status) => break status,
                None if start.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.error(format!("timed out after {:?}", self.timeout)));
                }
                None => std::thread::sleep(CHILD_POLL),
            }
        };

        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout)
                .map_err(|e| self.error(e.to_string()))?;
        }
        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                let _ = err.read_to_string(&mut stderr);
            }
            return Err(self.error(format!("{}: {}", status, stderr.trim())));
        }
        Ok(stdout)
    }
}

#[derive(Debug, Clone)]
pub struct CounterReader {
    root: PathBuf,
    users: UsersCommand,
}

impl Default for CounterReader {
    fn default() -> Self {
        Self::new("/")
    }
}

impl CounterReader {
    /// `root` prefixes every source path (`/` on a live host, a fixture dir in tests).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            users: UsersCommand::default(),
        }
    }

    pub fn with_users_command(mut self, users: UsersCommand) -> Self {
        self.users = users;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel.trim_start_matches('/'))
    }

    fn read(&self, rel: &str) -> Result<String, CollectError> {
        let path = self.path(rel);
        std::fs::read_to_string(&path).map_err(|e| CollectError::io(path, e))
    }

    /// Like `read`, but a missing file is `None` rather than an error.
    fn read_optional(&self, rel: &str) -> Result<Option<String>, CollectError> {
        let path = self.path(rel);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CollectError::io(path, e)),
        }
    }

    pub fn cpu_times(&self) -> Result<CpuTimes, CollectError> {
        parse::parse_cpu_times(&self.read("proc/stat")?)
    }

    pub fn disk_io(&self) -> Result<DiskIoCounters, CollectError> {
        parse::parse_diskstats(&self.read("proc/diskstats")?)
    }

    pub fn nic(&self) -> Result<NicCounters, CollectError> {
        parse::parse_net_dev(&self.read("proc/net/dev")?)
    }

    pub fn meminfo(&self) -> Result<MemInfo, CollectError> {
        parse::parse_meminfo(&self.read("proc/meminfo")?)
    }

    pub fn loadavg(&self) -> Result<LoadAvg, CollectError> {
        parse::parse_loadavg(&self.read("proc/loadavg")?)
    }

    pub fn uptime_secs(&self) -> Result<f64, CollectError> {
        parse::parse_uptime(&self.read("proc/uptime")?)
    }

    /// IPv4 TCP counts plus IPv6 in-use sockets when sockstat6 exists.
    pub fn tcp_sockets(&self) -> Result<TcpSockets, CollectError> {
        let mut sockets = parse::parse_sockstat(&self.read("proc/net/sockstat")?)?;
        if let Some(content) = self.read_optional("proc/net/sockstat6")? {
            sockets.inuse = sockets.inuse.saturating_add(parse::parse_sockstat6(&content)?);
        }
        Ok(sockets)
    }

    pub fn mounts(&self) -> Result<Vec<MountEntry>, CollectError> {
        Ok(parse::parse_mounts(&self.read("proc/mounts")?))
    }

    pub fn fs_stats(&self, mount_point: &str) -> Result<FsStats, CollectError> {
        let path = self.path(mount_point);
        statfs::statvfs(&path.to_string_lossy())
    }

    pub fn cpu_processors(&self) -> Result<u64, CollectError> {
        Ok(parse::count_processors(&self.read("proc/cpuinfo")?))
    }

    pub fn os_type(&self) -> Result<String, CollectError> {
        for rel in RELEASE_FILES {
            let Some(content) = self.read_optional(rel)? else {
                continue;
            };
            let name = if rel.ends_with("os-release") {
                parse::parse_os_release(&content)
            } else {
                parse::first_line(&content)
            };
            if let Some(name) = name {
                return Ok(name);
            }
        }
        Err(CollectError::parse("/etc/*-release", "no release file found"))
    }

    /// Logged-in sessions as reported by `users`.
    pub fn logged_in_users(&self) -> Result<u64, CollectError> {
        Ok(parse::count_users(&self.users.run()?))
    }
}
