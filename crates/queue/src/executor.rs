//! Database-backed redundancy executor.
//!
//! Duplicates the streaming playlists of the candidates picked by the
//! redundancy repository into the local redundancy directory, and keeps the
//! redundancy rows in sync with the enabled strategies.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use peertube_common::{AppError, AppResult, Config, RedundancyConfig, RedundancyStrategyConfig};
use peertube_db::entities::{video, video_streaming_playlist};
use peertube_db::models::{Video, VideoStreamingPlaylist};
use peertube_db::repositories::{
    NewVideoRedundancy, RedundancyFileRemover, RedundancyWithVideo, VideoRedundancyRepository,
    expiration_from_now,
};
use url::Url;

use crate::hls::PlaylistDownloader;
use crate::redundancy::{RedundancyExecutor, StrategyOutcome};

/// Extra room granted to a download over the announced playlist size, in percent.
const DOWNLOAD_SIZE_TOLERANCE_PERCENT: u64 = 5;

/// Whether adding `video_size` bytes to `total_used` exceeds `max_size`.
#[must_use]
pub fn is_too_heavy(total_used: i64, video_size: i64, max_size: u64) -> bool {
    let will_use = total_used.max(0).saturating_add(video_size.max(0));

    u64::try_from(will_use).unwrap_or(u64::MAX) > max_size
}

/// Size of every streaming playlist file of `video`.
#[must_use]
pub fn streaming_playlists_size(video: &Video) -> i64 {
    video
        .video_streaming_playlists
        .iter()
        .map(VideoStreamingPlaylist::total_files_size)
        .sum()
}

/// Public URLs of a local redundancy of an HLS playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundancyUrls {
    /// ActivityPub id of the cache file.
    pub url: String,
    /// Where the duplicated master playlist is served from.
    pub file_url: String,
}

impl RedundancyUrls {
    /// URLs of the redundancy of `video` served by the instance at `server_url`.
    #[must_use]
    pub fn build(server_url: &str, video: &Video, playlist: &VideoStreamingPlaylist) -> Self {
        let server_url = server_url.trim_end_matches('/');
        let filename = playlist.playlist_filename.as_deref().unwrap_or("master.m3u8");

        Self {
            url: format!("{server_url}/redundancy/streaming-playlists/hls/{}", video.uuid),
            file_url: format!("{server_url}/static/redundancy/hls/{}/{filename}", video.uuid),
        }
    }
}

/// Removes the redundancy directory of a video.
#[derive(Debug, Clone)]
pub struct RedundancyDirectoryRemover {
    root: PathBuf,
}

impl RedundancyDirectoryRemover {
    /// Remover for copies stored under `root`.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl RedundancyFileRemover for RedundancyDirectoryRemover {
    async fn remove_streaming_playlist_files(
        &self,
        video: &video::Model,
        _playlist: &video_streaming_playlist::Model,
    ) -> AppResult<()> {
        let dir = self.root.join(video.uuid.to_string());

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "Cannot remove {}: {e}",
                dir.display()
            ))),
        }
    }
}

/// Runs redundancy sweeps against the database.
#[derive(Clone)]
pub struct DbRedundancyExecutor {
    repo: VideoRedundancyRepository,
    downloader: Arc<dyn PlaylistDownloader>,
    redundancy: RedundancyConfig,
    trending_days: u32,
    server_url: String,
    redundancy_dir: PathBuf,
}

impl DbRedundancyExecutor {
    /// Create an executor using the redundancy, trending, server and storage settings of `config`.
    #[must_use]
    pub fn new(
        repo: VideoRedundancyRepository,
        downloader: Arc<dyn PlaylistDownloader>,
        config: &Config,
    ) -> Self {
        Self {
            repo,
            downloader,
            redundancy: config.redundancy.clone(),
            trending_days: config.trending.interval_days,
            server_url: config.server.url.clone(),
            redundancy_dir: config.storage.redundancy_dir.clone(),
        }
    }

    async fn is_candidate_too_heavy(
        &self,
        strategy: &RedundancyStrategyConfig,
        video: &Video,
    ) -> AppResult<bool> {
        let stats = self.repo.get_stats(strategy.strategy.as_str()).await?;
        let video_size = streaming_playlists_size(video);

        tracing::debug!(
            max_size = strategy.size,
            already_used = stats.total_used,
            video_size,
            video = %video.uuid,
            "Checking candidate size"
        );

        Ok(is_too_heavy(stats.total_used, video_size, strategy.size))
    }

    /// Drop our oldest redundancies of `strategy` until the candidate fits or none is old enough.
    async fn purge_cache_if_needed(
        &self,
        strategy: &RedundancyStrategyConfig,
        video: &Video,
    ) -> AppResult<()> {
        while self.is_candidate_too_heavy(strategy, video).await? {
            let Some(oldest) = self
                .repo
                .load_oldest_local_expired(strategy.strategy, strategy.min_lifetime())
                .await?
            else {
                return Ok(());
            };

            let redundancies = self
                .repo
                .list_local_by_streaming_playlist_id(oldest.streaming_playlist.id)
                .await?;

            if redundancies.is_empty() {
                return Ok(());
            }

            for entry in &redundancies {
                tracing::info!(url = %entry.redundancy.url, "Purging redundancy to make room");
                self.repo.destroy(entry).await?;
            }
        }

        Ok(())
    }

    async fn create_video_redundancies(
        &self,
        strategy: &RedundancyStrategyConfig,
        video: &Video,
    ) -> AppResult<usize> {
        for playlist in &video.video_streaming_playlists {
            match self.repo.load_local_by_streaming_playlist_id(playlist.id).await? {
                Some(existing) => {
                    self.extend_redundancy(&existing).await?;
                }
                None => {
                    self.create_streaming_playlist_redundancy(strategy, video, playlist)
                        .await?;
                }
            }
        }

        Ok(video.video_streaming_playlists.len())
    }

    async fn create_streaming_playlist_redundancy(
        &self,
        strategy: &RedundancyStrategyConfig,
        video: &Video,
        playlist: &VideoStreamingPlaylist,
    ) -> AppResult<()> {
        let master_url = playlist
            .playlist_url
            .as_deref()
            .ok_or_else(|| {
                AppError::BadRequest(format!("Streaming playlist {} has no URL", playlist.id))
            })
            .and_then(|url| {
                Url::parse(url).map_err(|e| AppError::BadRequest(format!("Invalid playlist URL {url}: {e}")))
            })?;

        tracing::info!(
            video = %video.url,
            strategy = %strategy.strategy,
            "Duplicating streaming playlist in videos redundancy"
        );

        let size = u64::try_from(playlist.total_files_size()).unwrap_or(0);
        let max_bytes = size + size * DOWNLOAD_SIZE_TOLERANCE_PERCENT / 100;
        let dest = self.redundancy_dir.join(video.uuid.to_string());

        self.downloader.download(&master_url, &dest, max_bytes).await?;

        let urls = RedundancyUrls::build(&self.server_url, video, playlist);
        let expires_on = expiration_from_now(strategy.min_lifetime())?;

        let created = self
            .repo
            .create(NewVideoRedundancy {
                expires_on: Some(expires_on),
                file_url: urls.file_url,
                url: urls.url,
                strategy: Some(strategy.strategy.as_str().to_string()),
                actor_id: self.repo.server_actor_id(),
                video_streaming_playlist_id: playlist.id,
            })
            .await?;

        tracing::info!(master = %master_url, redundancy = %created.url, "Duplicated playlist");
        Ok(())
    }

    /// The enabled strategy a redundancy was created under.
    fn own_strategy(&self, entry: &RedundancyWithVideo) -> Option<&RedundancyStrategyConfig> {
        entry
            .redundancy
            .strategy
            .as_deref()
            .and_then(|name| self.redundancy.find_strategy(name))
    }

    /// Extend `entry` by the lifetime of its own strategy, or destroy it when that strategy is disabled.
    ///
    /// Returns whether the redundancy was kept.
    async fn extend_redundancy(&self, entry: &RedundancyWithVideo) -> AppResult<bool> {
        let Some(strategy) = self.own_strategy(entry) else {
            tracing::info!(
                url = %entry.redundancy.url,
                strategy = ?entry.redundancy.strategy,
                "Destroying redundancy because its strategy does not exist anymore"
            );
            self.repo.destroy(entry).await?;
            return Ok(false);
        };

        tracing::info!(url = %entry.redundancy.url, strategy = %strategy.strategy, "Extending expiration");
        self.repo
            .extend_expiration(entry.redundancy.clone(), strategy.min_lifetime())
            .await?;

        Ok(true)
    }

    async fn extend_or_destroy(&self, entry: &RedundancyWithVideo) -> AppResult<bool> {
        if let Some(strategy) = self.own_strategy(entry) {
            let stats = self.repo.get_stats(strategy.strategy.as_str()).await?;

            if is_too_heavy(stats.total_used, 0, strategy.size) {
                tracing::info!(
                    url = %entry.redundancy.url,
                    strategy = %strategy.strategy,
                    "Destroying redundancy because the cache size is too heavy"
                );
                self.repo.destroy(entry).await?;
                return Ok(false);
            }
        }

        self.extend_redundancy(entry).await
    }
}

#[async_trait]
impl RedundancyExecutor for DbRedundancyExecutor {
    async fn run_strategy(&self, strategy: &RedundancyStrategyConfig) -> AppResult<StrategyOutcome> {
        let Some(video) = self
            .repo
            .find_video_to_duplicate(strategy, self.redundancy.randomized_factor, self.trending_days)
            .await?
        else {
            return Ok(StrategyOutcome::NoCandidate);
        };

        self.purge_cache_if_needed(strategy, &video).await?;

        if self.is_candidate_too_heavy(strategy, &video).await? {
            return Ok(StrategyOutcome::TooHeavy { video_id: video.id });
        }

        tracing::info!(video = %video.url, strategy = %strategy.strategy, "Will duplicate video");

        let playlists = self.create_video_redundancies(strategy, &video).await?;

        Ok(StrategyOutcome::Duplicated {
            video_id: video.id,
            playlists,
        })
    }

    async fn extend_local_expiration(&self) -> AppResult<u64> {
        let expired = self.repo.list_local_expired().await?;
        let mut extended = 0;

        for entry in &expired {
            match self.extend_or_destroy(entry).await {
                Ok(true) => extended += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        video = %entry.video.uuid,
                        "Cannot extend or remove expiration of video from our redundancy system"
                    );
                }
            }
        }

        Ok(extended)
    }

    async fn purge_remote_expired(&self) -> AppResult<u64> {
        let expired = self.repo.list_remote_expired().await?;
        let mut purged = 0;

        for entry in &expired {
            match self.repo.destroy(entry).await {
                Ok(()) => purged += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        url = %entry.redundancy.url,
                        "Cannot remove redundancy from our redundancy system"
                    );
                }
            }
        }

        Ok(purged)
    }
}
