// Library for tests to access modules

pub mod anomaly;
pub mod collector;
pub mod config;
pub mod delivery;
pub mod journal;
pub mod logbuf;
pub mod metrics_repo;
pub mod models;
pub mod monitor;
pub mod snapshot;
