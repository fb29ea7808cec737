// Library for the two binaries and the integration tests

pub mod agent;
pub mod config;
pub mod counters;
pub mod history_repo;
pub mod logging;
pub mod models;
pub mod pruner;
pub mod reporter;
pub mod reshape;
pub mod routes;
pub mod sampler;
pub mod snapshot;
pub mod units;
pub mod version;
