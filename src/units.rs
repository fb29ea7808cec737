// Unit constants and rounding shared by the sampler and the wire models.

pub const KIB: f64 = 1024.0;
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
/// /proc/diskstats sector counts are always in 512-byte units, whatever the device.
pub const SECTOR_BYTES: u64 = 512;

/// Round to 2 decimals (the precision of every reported percentage and rate).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
