// SQLite store: one `hosts` row per (project, code) plus one `host_metrics` row per report.

mod schema;

use crate::models::{HostMetricSnapshot, HostRef, HostReport, HostRow};
use crate::units::now_millis;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct HistoryRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl HistoryRepo {
    pub async fn connect(
        path: &str,
        max_pool_size: u32,
        retention_days: u32,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        let retention_ms = (retention_days as i64) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(schema::CREATE_HOSTS)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_HOST_METRICS)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_HOST_METRICS_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert or refresh the static facts of a host. `alias` and `host_metric_id` survive.
    #[instrument(skip(self, report), fields(repo = "history", operation = "upsert_host", project = %report.project))]
    pub async fn upsert_host(&self, report: &HostReport) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hosts
            (code, hostname, ip, os_type, architecture, cpu_processors, mem_size, swap_size,
             disk_size, uptime, heartbeat_time, project, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (project, code) DO UPDATE SET
                hostname = excluded.hostname,
                ip = excluded.ip,
                os_type = excluded.os_type,
                architecture = excluded.architecture,
                cpu_processors = excluded.cpu_processors,
                mem_size = excluded.mem_size,
                swap_size = excluded.swap_size,
                disk_size = excluded.disk_size,
                uptime = excluded.uptime,
                heartbeat_time = excluded.heartbeat_time,
                version = excluded.version
            "#,
        )
        .bind(&report.code)
        .bind(&report.hostname)
        .bind(&report.ip)
        .bind(&report.os_type)
        .bind(&report.architecture)
        .bind(report.cpu_processors)
        .bind(report.mem_size)
        .bind(report.swap_size)
        .bind(report.disk_size)
        .bind(report.uptime)
        .bind(report.heartbeat_time)
        .bind(&report.project)
        .bind(&report.version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stores the row and points the host at it, in one transaction. Returns the new row id.
    #[instrument(skip(self, m), fields(repo = "history", operation = "insert_metric", project = %m.project))]
    pub async fn insert_metric(&self, m: &HostMetricSnapshot) -> anyhow::Result<i64> {
        let mut tx = self.pool.begin().await?;

        let insert = format!(
            "INSERT INTO host_metrics ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)",
            schema::METRIC_COLUMNS
        );
        let id = sqlx::query(&insert)
            .bind(&m.project)
            .bind(&m.code)
            .bind(&m.hostname)
            .bind(&m.ip)
            .bind(m.heartbeat_time)
            .bind(m.loadavg_1m)
            .bind(m.loadavg_5m)
            .bind(m.loadavg_15m)
            .bind(m.cpu_used)
            .bind(m.cpu_iowait)
            .bind(m.mem_used)
            .bind(m.swap_used)
            .bind(&m.disk_usage)
            .bind(m.disk_used)
            .bind(m.inode_used)
            .bind(m.disk_read_rate)
            .bind(m.disk_write_rate)
            .bind(m.disk_ios)
            .bind(m.nic_receive_rate)
            .bind(m.nic_receive_packets)
            .bind(m.nic_transmit_rate)
            .bind(m.nic_transmit_packets)
            .bind(m.tcp_sockets_inuse)
            .bind(m.tcp_sockets_tw)
            .bind(m.users)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        sqlx::query(
            "UPDATE hosts SET host_metric_id = $1, heartbeat_time = $2 WHERE project = $3 AND code = $4",
        )
        .bind(id)
        .bind(m.heartbeat_time)
        .bind(&m.project)
        .bind(&m.code)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Distinct projects with at least one registered host, in name order.
    #[instrument(skip(self), fields(repo = "history", operation = "list_projects"))]
    pub async fn list_projects(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT project FROM hosts ORDER BY project ASC")
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.try_get("project")?);
        }
        Ok(out)
    }

    /// Hosts of a project joined with their latest metric row. Hosts that have not reported
    /// metrics yet carry zeros.
    #[instrument(skip(self), fields(repo = "history", operation = "list_hosts"))]
    pub async fn list_hosts(&self, project: &str) -> anyhow::Result<Vec<HostRow>> {
        let rows = sqlx::query(
            r#"
            SELECT h.id, h.code, h.hostname, h.alias, h.ip, h.os_type, h.architecture,
                   h.cpu_processors, h.mem_size, h.disk_size, h.uptime, h.heartbeat_time, h.project,
                   COALESCE(m.loadavg_1m, 0.0) AS loadavg_1m,
                   COALESCE(m.loadavg_5m, 0.0) AS loadavg_5m,
                   COALESCE(m.loadavg_15m, 0.0) AS loadavg_15m,
                   COALESCE(m.cpu_used, 0.0) AS cpu_used,
                   COALESCE(m.cpu_iowait, 0.0) AS cpu_iowait,
                   COALESCE(m.mem_used, 0.0) AS mem_used,
                   COALESCE(m.swap_used, 0.0) AS swap_used,
                   COALESCE(m.disk_used, 0.0) AS disk_used,
                   COALESCE(m.inode_used, 0.0) AS inode_used,
                   COALESCE(m.users, 0) AS users
            FROM hosts h
            LEFT JOIN host_metrics m ON m.id = h.host_metric_id
            WHERE h.project = $1
            ORDER BY h.hostname ASC
            "#,
        )
        .bind(project)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_host_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self), fields(repo = "history", operation = "get_host"))]
    pub async fn get_host(&self, id: i64) -> anyhow::Result<Option<HostRef>> {
        let row = sqlx::query("SELECT id, code, project, cpu_processors FROM hosts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(HostRef {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            project: row.try_get("project")?,
            cpu_processors: row.try_get("cpu_processors")?,
        }))
    }

    /// Metric rows with `begin <= heartbeat_time <= end`, ascending by heartbeat_time.
    #[instrument(skip(self), fields(repo = "history", operation = "get_metrics_in_window"))]
    pub async fn get_metrics_in_window(
        &self,
        project: &str,
        code: &str,
        begin: i64,
        end: i64,
    ) -> anyhow::Result<Vec<HostMetricSnapshot>> {
        let query = format!(
            "SELECT {} FROM host_metrics
             WHERE project = $1 AND code = $2 AND heartbeat_time >= $3 AND heartbeat_time <= $4
             ORDER BY heartbeat_time ASC, id ASC",
            schema::METRIC_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(project)
            .bind(code)
            .bind(begin)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_metric_row(&row)?);
        }
        Ok(out)
    }

    /// Deletes metric rows older than the retention window. Returns the number removed.
    #[instrument(skip(self), fields(repo = "history", operation = "prune_old_data"))]
    pub async fn prune_old_data(&self) -> anyhow::Result<u64> {
        let cutoff = now_millis() - self.retention_ms;
        let result = sqlx::query("DELETE FROM host_metrics WHERE heartbeat_time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn parse_host_row(row: &SqliteRow) -> anyhow::Result<HostRow> {
        Ok(HostRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            hostname: row.try_get("hostname")?,
            alias: row.try_get("alias")?,
            ip: row.try_get("ip")?,
            os_type: row.try_get("os_type")?,
            architecture: row.try_get("architecture")?,
            cpu_processors: row.try_get("cpu_processors")?,
            mem_size: row.try_get("mem_size")?,
            disk_size: row.try_get("disk_size")?,
            uptime: row.try_get("uptime")?,
            heartbeat_time: row.try_get("heartbeat_time")?,
            project: row.try_get("project")?,
            loadavg_1m: row.try_get("loadavg_1m")?,
            loadavg_5m: row.try_get("loadavg_5m")?,
            loadavg_15m: row.try_get("loadavg_15m")?,
            cpu_used: row.try_get("cpu_used")?,
            cpu_iowait: row.try_get("cpu_iowait")?,
            mem_used: row.try_get("mem_used")?,
            swap_used: row.try_get("swap_used")?,
            disk_used: row.try_get("disk_used")?,
            inode_used: row.try_get("inode_used")?,
            users: row.try_get("users")?,
        })
    }

    fn parse_metric_row(row: &SqliteRow) -> anyhow::Result<HostMetricSnapshot> {
        Ok(HostMetricSnapshot {
            code: row.try_get("code")?,
            hostname: row.try_get("hostname")?,
            ip: row.try_get("ip")?,
            project: row.try_get("project")?,
            heartbeat_time: row.try_get("heartbeat_time")?,
            loadavg_1m: row.try_get("loadavg_1m")?,
            loadavg_5m: row.try_get("loadavg_5m")?,
            loadavg_15m: row.try_get("loadavg_15m")?,
            cpu_used: row.try_get("cpu_used")?,
            cpu_iowait: row.try_get("cpu_iowait")?,
            mem_used: row.try_get("mem_used")?,
            swap_used: row.try_get("swap_used")?,
            disk_usage: row.try_get("disk_usage")?,
            disk_used: row.try_get("disk_used")?,
            inode_used: row.try_get("inode_used")?,
            disk_read_rate: row.try_get("disk_read_rate")?,
            disk_write_rate: row.try_get("disk_write_rate")?,
            disk_ios: row.try_get("disk_ios")?,
            nic_receive_rate: row.try_get("nic_receive_rate")?,
            nic_receive_packets: row.try_get("nic_receive_packets")?,
            nic_transmit_rate: row.try_get("nic_transmit_rate")?,
            nic_transmit_packets: row.try_get("nic_transmit_packets")?,
            tcp_sockets_inuse: row.try_get("tcp_sockets_inuse")?,
            tcp_sockets_tw: row.try_get("tcp_sockets_tw")?,
            users: row.try_get("users")?,
        })
    }
}
