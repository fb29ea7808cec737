// Domain models: agent wire records, host listings, chart series

pub mod disk_usage;
mod host;
mod report;
mod series;

pub use disk_usage::{DiskUsage, DiskUsageDecodeError};
pub use host::{
    CPU_THRESHOLD_PCT, DISK_THRESHOLD_PCT, HostRef, HostRow, HostSummary, MEM_THRESHOLD_PCT,
    ProjectEntry,
};
pub use report::{
    DEFAULT_PROJECT, HostMetricSnapshot, HostReport, ValidationError, normalize_project,
};
pub use series::{Series, SeriesSet};
