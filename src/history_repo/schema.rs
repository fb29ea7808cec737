// DDL for the host registry and the per-cycle metric rows.
// One schema for every project; the project is a bound column, never part of a table name.

pub(super) const CREATE_HOSTS: &str = r#"
    CREATE TABLE IF NOT EXISTS hosts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL,
        hostname TEXT NOT NULL,
        alias TEXT,
        ip TEXT NOT NULL,
        os_type TEXT NOT NULL,
        architecture TEXT NOT NULL,
        cpu_processors INTEGER NOT NULL,
        mem_size INTEGER NOT NULL,
        swap_size INTEGER NOT NULL,
        disk_size INTEGER NOT NULL,
        uptime REAL NOT NULL,
        heartbeat_time INTEGER NOT NULL,
        host_metric_id INTEGER,
        project TEXT NOT NULL,
        version TEXT NOT NULL,
        UNIQUE (project, code)
    )
"#;

pub(super) const CREATE_HOST_METRICS: &str = r#"
    CREATE TABLE IF NOT EXISTS host_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project TEXT NOT NULL,
        code TEXT NOT NULL,
        hostname TEXT NOT NULL,
        ip TEXT NOT NULL,
        heartbeat_time INTEGER NOT NULL,
        loadavg_1m REAL NOT NULL,
        loadavg_5m REAL NOT NULL,
        loadavg_15m REAL NOT NULL,
        cpu_used REAL NOT NULL,
        cpu_iowait REAL NOT NULL,
        mem_used REAL NOT NULL,
        swap_used REAL NOT NULL,
        disk_usage TEXT NOT NULL,
        disk_used REAL NOT NULL,
        inode_used REAL NOT NULL,
        disk_read_rate REAL NOT NULL,
        disk_write_rate REAL NOT NULL,
        disk_ios INTEGER NOT NULL,
        nic_receive_rate REAL NOT NULL,
        nic_receive_packets INTEGER NOT NULL,
        nic_transmit_rate REAL NOT NULL,
        nic_transmit_packets INTEGER NOT NULL,
        tcp_sockets_inuse INTEGER NOT NULL,
        tcp_sockets_tw INTEGER NOT NULL,
        users INTEGER NOT NULL
    )
"#;

pub(super) const CREATE_HOST_METRICS_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_host_metrics_window ON host_metrics(project, code, heartbeat_time)";

pub(super) const METRIC_COLUMNS: &str = "project, code, hostname, ip, heartbeat_time, \
     loadavg_1m, loadavg_5m, loadavg_15m, cpu_used, cpu_iowait, mem_used, swap_used, \
     disk_usage, disk_used, inode_used, disk_read_rate, disk_write_rate, disk_ios, \
     nic_receive_rate, nic_receive_packets, nic_transmit_rate, nic_transmit_packets, \
     tcp_sockets_inuse, tcp_sockets_tw, users";
