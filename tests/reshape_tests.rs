// Disk usage encoding, query window math and series reshaping

mod common;

use common::sample_snapshot;
use hostmon::models::disk_usage::{decode, encode, last_per_mount};
use hostmon::models::{DiskUsage, DiskUsageDecodeError};
use hostmon::reshape::{
    DEFAULT_LIMIT_MINUTES, DEFAULT_OFFSET_MINUTES, QueryWindow, reshape,
};

const NOW: i64 = 1_700_000_000_000;
const MIN: i64 = 60_000;

#[test]
fn encode_decode_preserves_tuples_and_order() {
    let usages = vec![
        DiskUsage::new("/", 40, 31.456, 2.0),
        DiskUsage::new("/data", 100, 50.0, 10.0),
        DiskUsage::new("/var/lib/my_app", 7, 99.99, 0.01),
    ];
    let encoded = encode(&usages);
    assert_eq!(
        encoded,
        "/_40_31.46_2.00,/data_100_50.00_10.00,/var/lib/my_app_7_99.99_0.01"
    );
    assert_eq!(decode(&encoded).unwrap(), usages);
}

#[test]
fn encode_skips_mounts_with_tuple_separator() {
    let usages = vec![
        DiskUsage::new("/mnt/a,b", 1, 1.0, 1.0),
        DiskUsage::new("/", 2, 3.0, 4.0),
    ];
    assert_eq!(encode(&usages), "/_2_3.00_4.00");
}

#[test]
fn empty_encoding_decodes_to_nothing() {
    assert_eq!(encode(&[]), "");
    assert!(decode("").unwrap().is_empty());
}

#[test]
fn decode_rejects_malformed_tuples() {
    assert!(matches!(
        decode("/_40_31.46"),
        Err(DiskUsageDecodeError::FieldCount { .. })
    ));
    assert!(matches!(
        decode("/_forty_31.46_2.00"),
        Err(DiskUsageDecodeError::BadNumber { field: "total", .. })
    ));
    assert!(matches!(
        decode("/_40_NaN_2.00"),
        Err(DiskUsageDecodeError::BadNumber { field: "disk_used", .. })
    ));
    assert!(decode("_40_1.00_2.00").is_err());
}

#[test]
fn default_window_ends_now() {
    let w = QueryWindow::from_offset_limit(NOW, DEFAULT_OFFSET_MINUTES, DEFAULT_LIMIT_MINUTES)
        .unwrap();
    assert_eq!(w.begin, NOW - 240 * MIN);
    assert_eq!(w.end, NOW);
}

#[test]
fn narrow_window_ends_in_the_past() {
    let w = QueryWindow::from_offset_limit(NOW, 10, 5).unwrap();
    assert_eq!(w.begin, NOW - 10 * MIN);
    assert_eq!(w.end, NOW - 5 * MIN);
}

#[test]
fn unlimited_window_ends_now() {
    let w = QueryWindow::from_offset_limit(NOW, 1440, -1).unwrap();
    assert_eq!(w.begin, NOW - 1440 * MIN);
    assert_eq!(w.end, NOW);
}

#[test]
fn out_of_range_window_is_rejected() {
    assert!(QueryWindow::from_offset_limit(NOW, 999_999_999_999_999_999, 5).is_none());
    assert!(QueryWindow::from_offset_limit(NOW, i64::MAX, -1).is_none());
    assert!(QueryWindow::from_offset_limit(NOW, -999_999_999_999_999_999, 0).is_none());
    assert!(QueryWindow::from_offset_limit(NOW, 10, i64::MIN).is_none());
}

#[test]
fn window_bounds_are_inclusive() {
    let w = QueryWindow::from_offset_limit(NOW, 10, 5).unwrap();
    assert!(w.contains(w.begin));
    assert!(w.contains(w.end));
    assert!(!w.contains(w.end + 1));
    assert!(!w.contains(w.begin - 1));
}

#[test]
fn fixed_series_have_one_value_per_row() {
    let rows: Vec<_> = (0..5)
        .map(|i| sample_snapshot("web-1", "default", NOW + i * MIN))
        .collect();
    let set = reshape(&rows).unwrap();
    assert_eq!(set.len(), 5);
    assert_eq!(set.timestamps, rows.iter().map(|r| r.heartbeat_time).collect::<Vec<_>>());

    for name in [
        "loadavg_1m",
        "loadavg_5m",
        "loadavg_15m",
        "cpu_usage",
        "cpu_iowait",
        "mem_usage",
        "swap_usage",
        "read_rate",
        "write_rate",
        "receive_rate",
        "transmit_rate",
        "inuse",
        "tw",
        "users",
    ] {
        let s = set.get(name).unwrap_or_else(|| panic!("missing series {name}"));
        assert_eq!(s.data.len(), 5, "{name}");
    }
    assert_eq!(set.get("cpu_usage").unwrap().data[0], 12.5);
    assert_eq!(set.get("inuse").unwrap().data[0], 15.0);
    for s in &set.disk_usage {
        assert!(s.data.len() <= 5);
    }
}

#[test]
fn data_mount_series_across_three_rows() {
    let rows: Vec<_> = (0..3)
        .map(|i| {
            let mut r = sample_snapshot("db-1", "default", NOW + i * MIN);
            r.disk_usage = "/data_100_50.00_10.00".into();
            r
        })
        .collect();
    let set = reshape(&rows).unwrap();
    let disk = set.get("Disk Usage of /data (100G)").unwrap();
    assert_eq!(disk.data, vec![50.0, 50.0, 50.0]);
    let inode = set.get("Inode Usage of /data (100G)").unwrap();
    assert_eq!(inode.data, vec![10.0, 10.0, 10.0]);
}

#[test]
fn repeated_mount_in_a_row_counts_once() {
    let rows: Vec<_> = (0..3)
        .map(|i| {
            let mut r = sample_snapshot("db-1", "default", NOW + i * MIN);
            r.disk_usage = "/data_100_40.00_5.00,/_40_30.00_2.00,/data_100_50.00_10.00".into();
            r
        })
        .collect();
    assert!(rows.iter().all(|r| r.clone().validate().is_ok()));
    let set = reshape(&rows).unwrap();
    for s in &set.disk_usage {
        assert_eq!(s.data.len(), set.timestamps.len(), "{}", s.name);
    }
    // The later tuple for a mount wins.
    assert_eq!(
        set.get("Disk Usage of /data (100G)").unwrap().data,
        vec![50.0, 50.0, 50.0]
    );
}

#[test]
fn last_per_mount_keeps_position_of_the_winner() {
    let usages = decode("/data_100_40.00_5.00,/_40_30.00_2.00,/data_100_50.00_10.00").unwrap();
    let kept = last_per_mount(usages);
    let mounts: Vec<&str> = kept.iter().map(|u| u.mount_point.as_str()).collect();
    assert_eq!(mounts, vec!["/", "/data"]);
    assert_eq!(kept[1].disk_used_pct, 50.0);
}

#[test]
fn mount_appearing_mid_window_has_a_shorter_series() {
    let mut rows: Vec<_> = (0..4)
        .map(|i| {
            let mut r = sample_snapshot("db-1", "default", NOW + i * MIN);
            r.disk_usage = "/_40_30.00_2.00".into();
            r
        })
        .collect();
    rows[2].disk_usage = "/_40_31.00_2.00,/mnt/backup_500_5.00_0.10".into();
    rows[3].disk_usage = "/_40_32.00_2.00,/mnt/backup_500_6.00_0.10".into();

    let set = reshape(&rows).unwrap();
    assert_eq!(
        set.get("Disk Usage of / (40G)").unwrap().data,
        vec![30.0, 30.0, 31.0, 32.0]
    );
    assert_eq!(
        set.get("Disk Usage of /mnt/backup (500G)").unwrap().data,
        vec![5.0, 6.0]
    );
}

#[test]
fn dynamic_series_are_in_name_order() {
    let mut row = sample_snapshot("db-1", "default", NOW);
    row.disk_usage = "/var_10_1.00_1.00,/_40_2.00_2.00,/data_100_3.00_3.00".into();
    let set = reshape(&[row]).unwrap();
    let names: Vec<&str> = set.disk_usage.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Disk Usage of / (40G)",
            "Disk Usage of /data (100G)",
            "Disk Usage of /var (10G)",
            "Inode Usage of / (40G)",
            "Inode Usage of /data (100G)",
            "Inode Usage of /var (10G)",
        ]
    );
}

#[test]
fn malformed_row_fails_the_whole_reshape() {
    let mut rows: Vec<_> = (0..3)
        .map(|i| sample_snapshot("db-1", "default", NOW + i * MIN))
        .collect();
    rows[1].disk_usage = "/data_100_fifty_10.00".into();
    assert!(reshape(&rows).is_err());
}

#[test]
fn empty_window_is_an_empty_set() {
    let set = reshape(&[]).unwrap();
    assert!(set.is_empty());
    assert!(set.disk_usage.is_empty());
    assert!(set.get("cpu_usage").unwrap().data.is_empty());
}
