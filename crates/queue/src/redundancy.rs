//! Periodic video redundancy sweep.

#![allow(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use peertube_common::{AppResult, RedundancyConfig, RedundancyStrategyConfig};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Result of one strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The candidate window was empty.
    NoCandidate,
    /// The candidate does not fit in the strategy cache, even after purging.
    TooHeavy { video_id: i32 },
    /// The candidate playlists were duplicated or had their redundancy extended.
    Duplicated { video_id: i32, playlists: usize },
}

/// Counters of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub duplicated: usize,
    pub failed_strategies: usize,
    pub extended: u64,
    pub purged: u64,
}

/// Work performed by a redundancy sweep.
#[async_trait]
pub trait RedundancyExecutor: Send + Sync {
    /// Pick a candidate for `strategy` and duplicate it.
    async fn run_strategy(&self, strategy: &RedundancyStrategyConfig) -> AppResult<StrategyOutcome>;

    /// Extend or drop our expired redundancies. Returns the number extended.
    async fn extend_local_expiration(&self) -> AppResult<u64>;

    /// Drop expired redundancies announced by other instances. Returns the number dropped.
    async fn purge_remote_expired(&self) -> AppResult<u64>;
}

/// Run every configured strategy once, then the expiration passes.
///
/// A failing strategy is logged and does not prevent the next ones.
pub async fn run_redundancy_sweep<E: RedundancyExecutor + ?Sized>(
    config: &RedundancyConfig,
    executor: &E,
) -> SweepSummary {
    let mut summary = SweepSummary::default();

    for strategy in &config.strategies {
        tracing::info!(strategy = %strategy.strategy, "Running redundancy scheduler");

        match executor.run_strategy(strategy).await {
            Ok(StrategyOutcome::NoCandidate) => {
                tracing::debug!(strategy = %strategy.strategy, "No video to duplicate");
            }
            Ok(StrategyOutcome::TooHeavy { video_id }) => {
                tracing::info!(
                    strategy = %strategy.strategy,
                    video_id,
                    "Video is too big for our cache, skipping"
                );
            }
            Ok(StrategyOutcome::Duplicated { video_id, playlists }) => {
                tracing::info!(strategy = %strategy.strategy, video_id, playlists, "Duplicated video");
                summary.duplicated += 1;
            }
            Err(e) => {
                tracing::error!(strategy = %strategy.strategy, error = %e, "Cannot run videos redundancy");
                summary.failed_strategies += 1;
            }
        }
    }

    match executor.extend_local_expiration().await {
        Ok(count) => summary.extended = count,
        Err(e) => tracing::error!(error = %e, "Failed to extend local redundancies"),
    }

    match executor.purge_remote_expired().await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(count, "Removed expired remote redundancies");
            }
            summary.purged = count;
        }
        Err(e) => tracing::error!(error = %e, "Failed to purge remote redundancies"),
    }

    summary
}

/// Spawn the sweep loop, running every `config.check_interval()`.
///
/// Sweeps never overlap: a tick missed during a long sweep is delayed.
pub fn run_redundancy_scheduler<E: RedundancyExecutor + 'static>(
    config: RedundancyConfig,
    executor: Arc<E>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if config.strategies.is_empty() {
            tracing::info!("No redundancy strategy enabled");
        }

        let mut interval = interval(config.check_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let summary = run_redundancy_sweep(&config, executor.as_ref()).await;
            tracing::debug!(?summary, "Redundancy sweep finished");
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use peertube_common::{AppError, RedundancyStrategy};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeExecutor {
        runs: Mutex<Vec<RedundancyStrategy>>,
        sweeps: Mutex<u32>,
    }

    #[async_trait]
    impl RedundancyExecutor for FakeExecutor {
        async fn run_strategy(&self, strategy: &RedundancyStrategyConfig) -> AppResult<StrategyOutcome> {
            self.runs.lock().unwrap().push(strategy.strategy);

            match strategy.strategy {
                RedundancyStrategy::MostViews => Err(AppError::Database("unique violation".to_string())),
                RedundancyStrategy::Trending => Ok(StrategyOutcome::Duplicated {
                    video_id: 4,
                    playlists: 1,
                }),
                RedundancyStrategy::RecentlyAdded => Ok(StrategyOutcome::NoCandidate),
            }
        }

        async fn extend_local_expiration(&self) -> AppResult<u64> {
            Ok(2)
        }

        async fn purge_remote_expired(&self) -> AppResult<u64> {
            *self.sweeps.lock().unwrap() += 1;
            Ok(1)
        }
    }

    fn strategy(strategy: RedundancyStrategy) -> RedundancyStrategyConfig {
        RedundancyStrategyConfig {
            strategy,
            size: 10_000,
            min_lifetime_secs: 3600,
            min_views: Some(1),
        }
    }

    fn config() -> RedundancyConfig {
        RedundancyConfig {
            check_interval_secs: 60,
            strategies: vec![
                strategy(RedundancyStrategy::MostViews),
                strategy(RedundancyStrategy::Trending),
                strategy(RedundancyStrategy::RecentlyAdded),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_failing_strategy_does_not_stop_the_sweep() {
        let executor = FakeExecutor::default();
        let summary = run_redundancy_sweep(&config(), &executor).await;

        assert_eq!(
            *executor.runs.lock().unwrap(),
            vec![
                RedundancyStrategy::MostViews,
                RedundancyStrategy::Trending,
                RedundancyStrategy::RecentlyAdded
            ]
        );
        assert_eq!(
            summary,
            SweepSummary {
                duplicated: 1,
                failed_strategies: 1,
                extended: 2,
                purged: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_sweeps_every_interval() {
        let executor = Arc::new(FakeExecutor::default());
        let handle = run_redundancy_scheduler(config(), executor.clone());

        tokio::time::sleep(Duration::from_secs(130)).await;
        handle.abort();

        assert_eq!(*executor.sweeps.lock().unwrap(), 3);
    }
}
