// Per-mount disk usage and its denormalized string encoding
// (`<mount>_<total>_<disk%>_<inode%>` tuples joined by `,`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::units::round2;

pub const TUPLE_SEPARATOR: char = ',';
pub const FIELD_SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_gib: u64,
    pub disk_used_pct: f64,
    pub inode_used_pct: f64,
}

impl DiskUsage {
    /// Percentages are stored at the encoded precision so encode/decode is lossless.
    pub fn new(
        mount_point: impl Into<String>,
        total_gib: u64,
        disk_used_pct: f64,
        inode_used_pct: f64,
    ) -> Self {
        Self {
            mount_point: mount_point.into(),
            total_gib,
            disk_used_pct: round2(disk_used_pct),
            inode_used_pct: round2(inode_used_pct),
        }
    }

    pub fn disk_series_name(&self) -> String {
        format!("Disk Usage of {} ({}G)", self.mount_point, self.total_gib)
    }

    pub fn inode_series_name(&self) -> String {
        format!("Inode Usage of {} ({}G)", self.mount_point, self.total_gib)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiskUsageDecodeError {
    #[error("disk usage tuple {tuple:?}: expected 4 `_`-separated fields")]
    FieldCount { tuple: String },
    #[error("disk usage tuple {tuple:?}: bad {field}: {value:?}")]
    BadNumber {
        tuple: String,
        field: &'static str,
        value: String,
    },
}

/// Mount points containing the tuple separator cannot be encoded; they are skipped.
pub fn is_encodable_mount(mount_point: &str) -> bool {
    !mount_point.is_empty() && !mount_point.contains(TUPLE_SEPARATOR)
}

pub fn encode(usages: &[DiskUsage]) -> String {
    let mut tuples = Vec::with_capacity(usages.len());
    for u in usages {
        if !is_encodable_mount(&u.mount_point) {
            tracing::warn!(mount_point = %u.mount_point, "mount point not encodable; skipped");
            continue;
        }
        tuples.push(format!(
            "{}{sep}{}{sep}{:.2}{sep}{:.2}",
            u.mount_point,
            u.total_gib,
            u.disk_used_pct,
            u.inode_used_pct,
            sep = FIELD_SEPARATOR
        ));
    }
    tuples.join(&TUPLE_SEPARATOR.to_string())
}

/// One entry per mount point: the last one listed wins, keeping its position.
pub fn last_per_mount(mut usages: Vec<DiskUsage>) -> Vec<DiskUsage> {
    let mut seen = HashSet::new();
    usages.reverse();
    usages.retain(|u| seen.insert(u.mount_point.clone()));
    usages.reverse();
    usages
}

/// Splits each tuple from the right: the last three fields are numeric, so a mount
/// point may itself contain `_`.
pub fn decode(encoded: &str) -> Result<Vec<DiskUsage>, DiskUsageDecodeError> {
    if encoded.trim().is_empty() {
        return Ok(Vec::new());
    }
    encoded.split(TUPLE_SEPARATOR).map(decode_tuple).collect()
}

fn decode_tuple(tuple: &str) -> Result<DiskUsage, DiskUsageDecodeError> {
    let mut parts = tuple.rsplitn(4, FIELD_SEPARATOR);
    let (Some(inode), Some(disk), Some(total), Some(mount)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DiskUsageDecodeError::FieldCount {
            tuple: tuple.to_string(),
        });
    };
    if mount.is_empty() {
        return Err(DiskUsageDecodeError::FieldCount {
            tuple: tuple.to_string(),
        });
    }
    let bad = |field: &'static str, value: &str| DiskUsageDecodeError::BadNumber {
        tuple: tuple.to_string(),
        field,
        value: value.to_string(),
    };
    let total_gib = total.parse::<u64>().map_err(|_| bad("total", total))?;
    let disk_used_pct = disk
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| bad("disk_used", disk))?;
    let inode_used_pct = inode
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| bad("inode_used", inode))?;
    Ok(DiskUsage {
        mount_point: mount.to_string(),
        total_gib,
        disk_used_pct,
        inode_used_pct,
    })
}
