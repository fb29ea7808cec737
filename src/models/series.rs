// Chart-ready series, grouped the way the dashboard draws them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Named series aligned against one shared timestamp sequence (unix ms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub loadavg: Vec<Series>,
    pub cpu_usage: Vec<Series>,
    pub mem_usage: Vec<Series>,
    pub disk_usage: Vec<Series>,
    pub disk_io_rate: Vec<Series>,
    pub nic_io_rate: Vec<Series>,
    pub tcp_sockets: Vec<Series>,
    pub misc: Vec<Series>,
    pub timestamps: Vec<i64>,
}

impl SeriesSet {
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.loadavg
            .iter()
            .chain(&self.cpu_usage)
            .chain(&self.mem_usage)
            .chain(&self.disk_usage)
            .chain(&self.disk_io_rate)
            .chain(&self.nic_io_rate)
            .chain(&self.tcp_sockets)
            .chain(&self.misc)
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
