// Wire record validation, JSON field names and host summary flags

mod common;

use common::{sample_host_report, sample_snapshot};
use hostmon::models::*;
use hostmon::snapshot::{architecture_label, host_code, join_ips};

fn row() -> HostRow {
    HostRow {
        id: 1,
        code: host_code("web-1"),
        hostname: "web-1".into(),
        alias: None,
        ip: "10.0.0.5,192.168.1.5".into(),
        os_type: "Debian".into(),
        architecture: "64-bit 6.1.0 x86_64".into(),
        cpu_processors: 4,
        mem_size: 8,
        disk_size: 100,
        uptime: 1.5,
        heartbeat_time: 1_700_000_000_000,
        project: "default".into(),
        loadavg_1m: 1.234,
        loadavg_5m: 0.5,
        loadavg_15m: 0.25,
        cpu_used: 10.0,
        cpu_iowait: 1.0,
        mem_used: 20.0,
        swap_used: 0.0,
        disk_used: 30.0,
        inode_used: 5.0,
        users: 1,
    }
}

#[test]
fn host_code_is_sha256_hex() {
    let code = host_code("web-1");
    assert_eq!(code.len(), 64);
    assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(code, host_code("web-1"));
    assert_ne!(code, host_code("web-2"));
    assert_eq!(
        host_code(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn ip_list_is_sorted_and_deduplicated() {
    assert_eq!(
        join_ips(["192.168.1.5", "10.0.0.5", "10.0.0.5"]),
        "10.0.0.5,192.168.1.5"
    );
    assert_eq!(join_ips(Vec::<String>::new()), "");
}

#[test]
fn architecture_label_shape() {
    let label = architecture_label("6.1.0-18-amd64", "x86_64");
    assert!(label.ends_with("-bit 6.1.0-18-amd64 x86_64"));
}

#[test]
fn snapshot_json_uses_snake_case_wire_names() {
    let s = sample_snapshot("web-1", "default", 1);
    let json = serde_json::to_value(&s).unwrap();
    for key in [
        "heartbeat_time",
        "loadavg_1m",
        "cpu_iowait",
        "disk_usage",
        "nic_receive_packets",
        "tcp_sockets_tw",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    let back: HostMetricSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back, s);
}

#[test]
fn snapshot_validation_normalizes_project() {
    let mut s = sample_snapshot("web-1", "  Prod-EU ", 1);
    s.validate().unwrap();
    assert_eq!(s.project, "prod-eu");
}

#[test]
fn snapshot_validation_rejects_bad_input() {
    let mut s = sample_snapshot("web-1", "prod; DROP TABLE hosts", 1);
    assert!(matches!(s.validate(), Err(ValidationError::Project(_))));

    let mut s = sample_snapshot("web-1", "default", 1);
    s.code = "not-hex".into();
    assert!(matches!(s.validate(), Err(ValidationError::Code(_))));

    let mut s = sample_snapshot("web-1", "default", 1);
    s.cpu_used = f64::NAN;
    assert!(matches!(
        s.validate(),
        Err(ValidationError::NotFinite { field: "cpu_used" })
    ));

    let mut s = sample_snapshot("web-1", "default", 1);
    s.users = -1;
    assert!(matches!(
        s.validate(),
        Err(ValidationError::Negative { field: "users" })
    ));

    let mut s = sample_snapshot("web-1", "default", 1);
    s.disk_usage = "/data_x_1_2".into();
    assert!(matches!(s.validate(), Err(ValidationError::DiskUsage(_))));

    let mut s = sample_snapshot("web-1", "default", 1);
    s.hostname = " ".into();
    assert!(matches!(
        s.validate(),
        Err(ValidationError::Empty { field: "hostname" })
    ));
}

#[test]
fn legacy_md5_codes_are_accepted() {
    let mut s = sample_snapshot("web-1", "default", 1);
    s.code = "0123456789abcdef0123456789abcdef".into();
    assert!(s.validate().is_ok());
}

#[test]
fn host_report_validation() {
    let mut r = sample_host_report("web-1", "DEFAULT");
    r.validate().unwrap();
    assert_eq!(r.project, "default");

    let mut r = sample_host_report("web-1", "default");
    r.version = String::new();
    assert!(r.validate().is_err());

    let mut r = sample_host_report("web-1", "default");
    r.cpu_processors = -2;
    assert!(r.validate().is_err());

    let long = "p".repeat(33);
    let mut r = sample_host_report("web-1", &long);
    assert!(matches!(r.validate(), Err(ValidationError::Project(_))));
}

#[test]
fn project_entry_name_is_uppercase() {
    let p = ProjectEntry::new("prod-eu".into());
    assert_eq!(p.code, "prod-eu");
    assert_eq!(p.name, "PROD-EU");
}

#[test]
fn summary_of_a_quiet_host() {
    let s = HostSummary::from(row());
    assert_eq!(s.loadavg, "1.23, 0.50, 0.25");
    assert_eq!(s.ips, vec!["10.0.0.5", "192.168.1.5"]);
    assert_eq!(s.alias, "");
    assert_eq!(s.cpu_usage, 10);
    assert_eq!(s.mem_usage, 20);
    assert_eq!(s.disk_usage, 30);
    assert_eq!(s.max_loadavg, 1.234);
    assert!(!s.is_overload);
    assert!(!s.is_overcpu);
    assert!(!s.is_overmem);
    assert!(!s.is_overdisk);
}

#[test]
fn summary_flags_use_truncated_maxima() {
    let mut r = row();
    r.loadavg_5m = 4.01;
    r.cpu_iowait = 80.99; // truncates to 80: not over
    r.swap_used = 81.0;
    r.inode_used = 85.5; // truncates to 85: not over
    let s = HostSummary::from(r);
    assert!(s.is_overload);
    assert_eq!(s.cpu_usage, 80);
    assert!(!s.is_overcpu);
    assert!(s.is_overmem);
    assert_eq!(s.disk_usage, 85);
    assert!(!s.is_overdisk);

    let mut r = row();
    r.cpu_used = 81.0;
    r.disk_used = 86.0;
    let s = HostSummary::from(r);
    assert!(s.is_overcpu);
    assert!(s.is_overdisk);
}
