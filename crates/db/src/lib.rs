//! Database layer for peertube-rs.
//!
//! - [`query`]: raw SQL builders for comment lists and video graphs, and the
//!   row folding that materializes them
//! - [`models`]: the materialized graphs
//! - [`entities`]: `SeaORM` entities of the redundancy bookkeeping tables
//! - [`repositories`]: database operations built on the above
//!
//! The schema is owned by the web application; this crate never migrates it.

pub mod entities;
pub mod models;
pub mod query;
pub mod repositories;
pub mod test_utils;

use peertube_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
