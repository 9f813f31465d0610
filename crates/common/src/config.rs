//! Application configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Application configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    /// Local instance configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Local storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Video redundancy configuration.
    #[serde(default)]
    #[validate(nested)]
    pub redundancy: RedundancyConfig,
    /// Trending computation configuration.
    #[serde(default)]
    #[validate(nested)]
    pub trending: TrendingConfig,
}

/// Local instance configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Public URL of the instance (e.g., `https://peertube.example.com`).
    pub url: String,
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the redundancy copies of remote streaming playlists.
    #[serde(default = "default_redundancy_dir")]
    pub redundancy_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            redundancy_dir: default_redundancy_dir(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Video redundancy configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedundancyConfig {
    /// Interval between two redundancy sweeps, in seconds.
    #[serde(default = "default_check_interval_secs")]
    #[validate(range(min = 1))]
    pub check_interval_secs: u64,
    /// Size of the top-K window a candidate is sampled from.
    #[serde(default = "default_randomized_factor")]
    #[validate(range(min = 1))]
    pub randomized_factor: u64,
    /// Timeout of one playlist file download, in seconds.
    #[serde(default = "default_download_timeout_secs")]
    #[validate(range(min = 1))]
    pub download_timeout_secs: u64,
    /// Enabled strategies, run in order on every sweep.
    #[serde(default)]
    #[validate(nested)]
    pub strategies: Vec<RedundancyStrategyConfig>,
}

impl Default for RedundancyConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            randomized_factor: default_randomized_factor(),
            download_timeout_secs: default_download_timeout_secs(),
            strategies: Vec::new(),
        }
    }
}

impl RedundancyConfig {
    /// Interval between two sweeps.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Timeout of one playlist file download.
    #[must_use]
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Find the configuration of a strategy by name, if it is still enabled.
    #[must_use]
    pub fn find_strategy(&self, name: &str) -> Option<&RedundancyStrategyConfig> {
        self.strategies.iter().find(|s| s.strategy.as_str() == name)
    }
}

/// Redundancy strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedundancyStrategy {
    /// Duplicate the most viewed remote videos.
    MostViews,
    /// Duplicate the currently trending remote videos.
    Trending,
    /// Duplicate recently published remote videos above a view threshold.
    RecentlyAdded,
}

impl RedundancyStrategy {
    /// Name stored in the `strategy` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MostViews => "most-views",
            Self::Trending => "trending",
            Self::RecentlyAdded => "recently-added",
        }
    }
}

impl fmt::Display for RedundancyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of one redundancy strategy.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_strategy_config"))]
pub struct RedundancyStrategyConfig {
    /// Strategy to run.
    pub strategy: RedundancyStrategy,
    /// Maximum cache size for this strategy, in bytes.
    #[validate(range(min = 1))]
    pub size: u64,
    /// Minimum lifetime of a redundancy before it may be replaced, in seconds.
    #[serde(default = "default_min_lifetime_secs")]
    #[validate(range(min = 1))]
    pub min_lifetime_secs: u64,
    /// Minimum views of a candidate (`recently-added` only).
    #[serde(default)]
    pub min_views: Option<u32>,
}

impl RedundancyStrategyConfig {
    /// Minimum lifetime as a duration.
    #[must_use]
    pub const fn min_lifetime(&self) -> Duration {
        Duration::from_secs(self.min_lifetime_secs)
    }
}

fn validate_strategy_config(config: &RedundancyStrategyConfig) -> Result<(), ValidationError> {
    if config.strategy == RedundancyStrategy::RecentlyAdded && config.min_views.is_none() {
        return Err(ValidationError::new("recently_added_requires_min_views"));
    }

    Ok(())
}

/// Trending computation configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrendingConfig {
    /// Number of days of views taken into account.
    #[serde(default = "default_trending_interval_days")]
    #[validate(range(min = 1))]
    pub interval_days: u32,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            interval_days: default_trending_interval_days(),
        }
    }
}

fn default_redundancy_dir() -> PathBuf {
    PathBuf::from("./storage/redundancy")
}

const fn default_download_timeout_secs() -> u64 {
    300
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_check_interval_secs() -> u64 {
    3600
}

const fn default_randomized_factor() -> u64 {
    5
}

const fn default_min_lifetime_secs() -> u64 {
    // 25 hours
    25 * 3600
}

const fn default_trending_interval_days() -> u32 {
    7
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `PEERTUBE_ENV`)
    /// 3. Environment variables with `PEERTUBE_` prefix
    pub fn load() -> Result<Self, crate::AppError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("PEERTUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PEERTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, crate::AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PEERTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Config {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(json!({
            "server": { "url": "https://peertube.test" },
            "database": { "url": "postgres://localhost/peertube" }
        }));

        assert_eq!(config.database.max_connections, 100);
        assert_eq!(config.redundancy.randomized_factor, 5);
        assert_eq!(config.redundancy.check_interval(), Duration::from_secs(3600));
        assert_eq!(config.trending.interval_days, 7);
        assert_eq!(config.redundancy.download_timeout(), Duration::from_secs(300));
        assert_eq!(
            config.storage.redundancy_dir,
            PathBuf::from("./storage/redundancy")
        );
        assert!(config.redundancy.strategies.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategies_parse() {
        let config = parse(json!({
            "server": { "url": "https://peertube.test" },
            "database": { "url": "postgres://localhost/peertube" },
            "redundancy": {
                "strategies": [
                    { "strategy": "most-views", "size": 1000 },
                    { "strategy": "recently-added", "size": 1000, "min_views": 10 }
                ]
            }
        }));

        assert!(config.validate().is_ok());
        assert_eq!(
            config.redundancy.strategies[0].strategy,
            RedundancyStrategy::MostViews
        );
        assert_eq!(config.redundancy.strategies[1].min_views, Some(10));
        assert!(config.redundancy.find_strategy("recently-added").is_some());
        assert!(config.redundancy.find_strategy("trending").is_none());
    }

    #[test]
    fn test_recently_added_requires_min_views() {
        let config = parse(json!({
            "server": { "url": "https://peertube.test" },
            "database": { "url": "postgres://localhost/peertube" },
            "redundancy": {
                "strategies": [{ "strategy": "recently-added", "size": 1000 }]
            }
        }));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_randomized_factor_is_rejected() {
        let config = parse(json!({
            "server": { "url": "https://peertube.test" },
            "database": { "url": "postgres://localhost/peertube" },
            "redundancy": { "randomized_factor": 0 }
        }));

        assert!(config.validate().is_err());
    }
}
