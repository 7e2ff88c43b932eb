//! Database layer for Goodnight

mod connection;
mod migrations;
mod repository;

pub use connection::{Database, SyncConfig};
pub use repository::{LibSqlSleepLogRepository, SleepLogRepository};
