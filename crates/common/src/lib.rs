//! Common utilities and shared types for peertube-rs.
//!
//! This crate provides foundational components used across all peertube-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//!
//! # Example
//!
//! ```no_run
//! use peertube_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Redundancy strategies: {}", config.redundancy.strategies.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;

pub use config::{
    Config, DatabaseConfig, RedundancyConfig, RedundancyStrategy, RedundancyStrategyConfig,
    ServerConfig, StorageConfig, TrendingConfig,
};
pub use error::{AppError, AppResult};
