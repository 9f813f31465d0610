//! Video redundancy repository.
//!
//! Candidate selection picks a remote video to duplicate. The candidate query
//! excludes the videos this instance already duplicates and returns the top
//! `randomized_factor` ids of a strategy's ranking. One of them is sampled
//! uniformly, so mirrors running the same strategy spread over the top
//! candidates instead of all duplicating the first one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use peertube_common::{AppError, AppResult, RedundancyStrategy, RedundancyStrategyConfig};
use rand::Rng;
use rand::seq::SliceRandom;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    Order, QueryFilter, QueryOrder, Set, SqlErr, Statement,
};
use uuid::Uuid;

use crate::entities::{
    Video as VideoEntity, VideoRedundancy, VideoStreamingPlaylist, video, video_redundancy,
    video_streaming_playlist,
};
use crate::models::{Video, video_privacy};
use crate::query::run_query::{BuiltQuery, Replacements};
use crate::repositories::VideoRepository;

/// Ranking of a candidate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStrategy {
    /// Most views first.
    MostViews,
    /// Most views since `since` first.
    Trending { since: DateTime<Utc> },
    /// Most recently published first, among videos with at least `min_views` views.
    RecentlyAdded { min_views: i32 },
}

/// Build the query returning the ranked candidate ids of a strategy.
#[must_use]
pub fn build_candidate_query(
    strategy: &CandidateStrategy,
    server_actor_id: i32,
    limit: u64,
) -> BuiltQuery {
    let mut replacements = Replacements::new();
    replacements.insert("serverActorId".to_string(), server_actor_id.into());
    replacements.insert(
        "limit".to_string(),
        i64::try_from(limit).unwrap_or(i64::MAX).into(),
    );

    let mut joins = vec![
        r#"INNER JOIN "videoChannel" AS "VideoChannel" ON "video"."channelId" = "VideoChannel"."id""#.to_string(),
        r#"INNER JOIN "actor" AS "VideoChannel->Actor" ON "VideoChannel"."actorId" = "VideoChannel->Actor"."id""#.to_string(),
        concat!(
            r#"INNER JOIN "server" AS "VideoChannel->Actor->Server" "#,
            r#"ON "VideoChannel->Actor"."serverId" = "VideoChannel->Actor->Server"."id" "#,
            r#"AND "VideoChannel->Actor->Server"."redundancyAllowed" IS TRUE"#
        )
        .to_string(),
        r#"INNER JOIN "videoStreamingPlaylist" AS "VideoStreamingPlaylists" ON "VideoStreamingPlaylists"."videoId" = "video"."id""#.to_string(),
    ];

    let mut wheres = vec![
        format!(r#""video"."privacy" = {}"#, video_privacy::PUBLIC),
        r#""video"."remote" IS TRUE"#.to_string(),
        r#""video"."isLive" IS FALSE"#.to_string(),
        concat!(
            r#""video"."id" NOT IN ("#,
            r#"SELECT "videoStreamingPlaylist"."videoId" FROM "videoRedundancy" "#,
            r#"INNER JOIN "videoStreamingPlaylist" ON "videoStreamingPlaylist"."id" = "videoRedundancy"."videoStreamingPlaylistId" "#,
            r#"WHERE "videoRedundancy"."actorId" = :serverActorId)"#
        )
        .to_string(),
    ];

    let order = match strategy {
        CandidateStrategy::MostViews => r#"ORDER BY "video"."views" DESC, "video"."id" ASC"#,
        CandidateStrategy::Trending { since } => {
            joins.push(
                concat!(
                    r#"LEFT JOIN "videoView" AS "VideoViews" ON "VideoViews"."videoId" = "video"."id" "#,
                    r#"AND "VideoViews"."startDate" >= :trendingSince"#
                )
                .to_string(),
            );
            replacements.insert("trendingSince".to_string(), (*since).into());

            r#"ORDER BY COALESCE(SUM("VideoViews"."views"), 0) DESC, "video"."id" ASC"#
        }
        CandidateStrategy::RecentlyAdded { min_views } => {
            wheres.push(r#""video"."views" >= :minViews"#.to_string());
            replacements.insert("minViews".to_string(), (*min_views).into());

            r#"ORDER BY "video"."publishedAt" DESC, "video"."id" ASC"#
        }
    };

    let sql = format!(
        r#"SELECT "video"."id" FROM "video" {} WHERE {} GROUP BY "video"."id" {} LIMIT :limit"#,
        joins.join(" "),
        wheres.join(" AND "),
        order
    );

    BuiltQuery::new(sql, replacements)
}

/// Expiration date of a redundancy created now and kept for `lifetime`.
pub fn expiration_from_now(lifetime: Duration) -> AppResult<DateTime<Utc>> {
    shift_date(Utc::now(), lifetime, true)
}

fn shift_date(at: DateTime<Utc>, by: Duration, forward: bool) -> AppResult<DateTime<Utc>> {
    let delta = chrono::Duration::from_std(by)
        .map_err(|e| AppError::Internal(format!("Invalid redundancy lifetime: {e}")))?;

    let shifted = if forward {
        at.checked_add_signed(delta)
    } else {
        at.checked_sub_signed(delta)
    };

    shifted.ok_or_else(|| AppError::Internal("Redundancy date out of range".to_string()))
}

/// Pick one id uniformly among the candidate window.
pub fn pick_candidate<R: Rng + ?Sized>(ids: &[i32], rng: &mut R) -> Option<i32> {
    ids.choose(rng).copied()
}

#[derive(Debug, FromQueryResult)]
struct CandidateRow {
    id: i32,
}

#[derive(Debug, FromQueryResult)]
struct ServerActorRow {
    actor_id: i32,
}

/// Storage used by the redundancies of one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromQueryResult)]
pub struct RedundancyStats {
    /// Bytes of every file of the duplicated playlists.
    pub total_used: i64,
    pub total_videos: i64,
    pub total_video_files: i64,
}

/// A redundancy with the playlist it duplicates and that playlist's video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundancyWithVideo {
    pub redundancy: video_redundancy::Model,
    pub streaming_playlist: video_streaming_playlist::Model,
    pub video: video::Model,
}

/// Input of a new redundancy.
#[derive(Debug, Clone)]
pub struct NewVideoRedundancy {
    pub expires_on: Option<DateTime<Utc>>,
    pub file_url: String,
    pub url: String,
    /// `None` for redundancies announced by other instances.
    pub strategy: Option<String>,
    pub actor_id: i32,
    pub video_streaming_playlist_id: i32,
}

/// Removes the local copy of a duplicated streaming playlist.
#[async_trait]
pub trait RedundancyFileRemover: Send + Sync {
    /// Delete the cached files of `playlist`.
    async fn remove_streaming_playlist_files(
        &self,
        video: &video::Model,
        playlist: &video_streaming_playlist::Model,
    ) -> AppResult<()>;
}

/// Repository for video redundancy operations.
#[derive(Clone)]
pub struct VideoRedundancyRepository {
    db: Arc<DatabaseConnection>,
    server_actor_id: i32,
    file_remover: Option<Arc<dyn RedundancyFileRemover>>,
}

impl VideoRedundancyRepository {
    /// Create a new redundancy repository acting as `server_actor_id`.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, server_actor_id: i32) -> Self {
        Self {
            db,
            server_actor_id,
            file_remover: None,
        }
    }

    /// Remove the cached files of owned redundancies when they are destroyed.
    #[must_use]
    pub fn with_file_remover(mut self, remover: Arc<dyn RedundancyFileRemover>) -> Self {
        self.file_remover = Some(remover);
        self
    }

    /// Actor of the local instance, which owns our redundancies.
    pub async fn load_server_actor_id(db: &DatabaseConnection) -> AppResult<i32> {
        let row = ServerActorRow::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            concat!(
                r#"SELECT "account"."actorId" AS "actor_id" FROM "application" "#,
                r#"INNER JOIN "account" ON "account"."applicationId" = "application"."id" LIMIT 1"#
            ),
        ))
        .one(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(|r| r.actor_id)
            .ok_or_else(|| AppError::Internal("Server actor not found".to_string()))
    }

    #[must_use]
    pub const fn server_actor_id(&self) -> i32 {
        self.server_actor_id
    }

    // ==================== Candidate Selection ====================

    /// Ranked candidate ids of a strategy, at most `limit` of them.
    pub async fn find_candidate_ids(
        &self,
        strategy: &CandidateStrategy,
        limit: u64,
    ) -> AppResult<Vec<i32>> {
        let statement = build_candidate_query(strategy, self.server_actor_id, limit).to_statement()?;

        tracing::debug!(sql = %statement.sql, "Selecting redundancy candidates");

        let rows = CandidateRow::find_by_statement(statement)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    /// Sample a candidate of the most viewed remote videos.
    pub async fn find_most_view_to_duplicate(&self, randomized_factor: u64) -> AppResult<Option<Video>> {
        self.find_to_duplicate(&CandidateStrategy::MostViews, randomized_factor)
            .await
    }

    /// Sample a candidate of the remote videos most viewed in the last `trending_days` days.
    pub async fn find_trending_to_duplicate(
        &self,
        randomized_factor: u64,
        trending_days: u32,
    ) -> AppResult<Option<Video>> {
        let since = Utc::now() - chrono::Duration::days(i64::from(trending_days));

        self.find_to_duplicate(&CandidateStrategy::Trending { since }, randomized_factor)
            .await
    }

    /// Sample a candidate of the recently published remote videos having `min_views` views.
    pub async fn find_recently_added_to_duplicate(
        &self,
        randomized_factor: u64,
        min_views: u32,
    ) -> AppResult<Option<Video>> {
        let min_views = i32::try_from(min_views).unwrap_or(i32::MAX);

        self.find_to_duplicate(&CandidateStrategy::RecentlyAdded { min_views }, randomized_factor)
            .await
    }

    /// Sample a candidate for a configured strategy.
    pub async fn find_video_to_duplicate(
        &self,
        config: &RedundancyStrategyConfig,
        randomized_factor: u64,
        trending_days: u32,
    ) -> AppResult<Option<Video>> {
        match config.strategy {
            RedundancyStrategy::MostViews => self.find_most_view_to_duplicate(randomized_factor).await,
            RedundancyStrategy::Trending => {
                self.find_trending_to_duplicate(randomized_factor, trending_days)
                    .await
            }
            RedundancyStrategy::RecentlyAdded => {
                self.find_recently_added_to_duplicate(randomized_factor, config.min_views.unwrap_or(0))
                    .await
            }
        }
    }

    async fn find_to_duplicate(
        &self,
        strategy: &CandidateStrategy,
        randomized_factor: u64,
    ) -> AppResult<Option<Video>> {
        let ids = self.find_candidate_ids(strategy, randomized_factor).await?;

        let picked = {
            let mut rng = rand::thread_rng();
            pick_candidate(&ids, &mut rng)
        };

        let Some(id) = picked else {
            return Ok(None);
        };

        tracing::debug!(video_id = id, candidates = ids.len(), "Picked redundancy candidate");

        let video = VideoRepository::new(self.db.clone())
            .load_with_files(id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))?;

        Ok(Some(video))
    }

    // ==================== Lookups ====================

    /// Our redundancy of a streaming playlist.
    pub async fn load_local_by_streaming_playlist_id(
        &self,
        streaming_playlist_id: i32,
    ) -> AppResult<Option<RedundancyWithVideo>> {
        let redundancy = VideoRedundancy::find()
            .filter(video_redundancy::Column::ActorId.eq(self.server_actor_id))
            .filter(video_redundancy::Column::VideoStreamingPlaylistId.eq(streaming_playlist_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.first_with_video(redundancy).await
    }

    /// Every redundancy of ours of a streaming playlist.
    pub async fn list_local_by_streaming_playlist_id(
        &self,
        streaming_playlist_id: i32,
    ) -> AppResult<Vec<RedundancyWithVideo>> {
        let redundancies = VideoRedundancy::find()
            .filter(video_redundancy::Column::ActorId.eq(self.server_actor_id))
            .filter(video_redundancy::Column::VideoStreamingPlaylistId.eq(streaming_playlist_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.with_videos(redundancies).await
    }

    /// Find a redundancy by its ActivityPub id.
    pub async fn load_by_url(&self, url: &str) -> AppResult<Option<video_redundancy::Model>> {
        VideoRedundancy::find()
            .filter(video_redundancy::Column::Url.eq(url))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether we duplicate the video `uuid`.
    pub async fn is_local_by_video_uuid_exists(&self, uuid: Uuid) -> AppResult<bool> {
        let redundancy = VideoRedundancy::find()
            .filter(video_redundancy::Column::ActorId.eq(self.server_actor_id))
            .filter(Expr::cust_with_values(
                concat!(
                    r#""videoRedundancy"."videoStreamingPlaylistId" IN ("#,
                    r#"SELECT "videoStreamingPlaylist"."id" FROM "videoStreamingPlaylist" "#,
                    r#"INNER JOIN "video" ON "video"."id" = "videoStreamingPlaylist"."videoId" "#,
                    r#"WHERE "video"."uuid" = $1)"#
                ),
                [uuid],
            ))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(redundancy.is_some())
    }

    // ==================== Expiration ====================

    /// Our oldest redundancy of `strategy` created more than `expires_after` ago.
    pub async fn load_oldest_local_expired(
        &self,
        strategy: RedundancyStrategy,
        expires_after: Duration,
    ) -> AppResult<Option<RedundancyWithVideo>> {
        let expired_date = shift_date(Utc::now(), expires_after, false)?;

        let redundancy = VideoRedundancy::find()
            .filter(video_redundancy::Column::ActorId.eq(self.server_actor_id))
            .filter(video_redundancy::Column::Strategy.eq(strategy.as_str()))
            .filter(video_redundancy::Column::CreatedAt.lt(expired_date))
            .order_by(video_redundancy::Column::CreatedAt, Order::Asc)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.first_with_video(redundancy).await
    }

    /// Our redundancies past their expiration date.
    pub async fn list_local_expired(&self) -> AppResult<Vec<RedundancyWithVideo>> {
        let redundancies = VideoRedundancy::find()
            .filter(video_redundancy::Column::ActorId.eq(self.server_actor_id))
            .filter(video_redundancy::Column::ExpiresOn.lt(Utc::now()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.with_videos(redundancies).await
    }

    /// Redundancies announced by other instances, past their expiration date.
    pub async fn list_remote_expired(&self) -> AppResult<Vec<RedundancyWithVideo>> {
        let redundancies = VideoRedundancy::find()
            .filter(video_redundancy::Column::ActorId.ne(self.server_actor_id))
            .filter(video_redundancy::Column::ExpiresOn.is_not_null())
            .filter(video_redundancy::Column::ExpiresOn.lt(Utc::now()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.with_videos(redundancies).await
    }

    /// Our redundancies of videos published by channels of `server_id`.
    pub async fn list_local_of_server(&self, server_id: i32) -> AppResult<Vec<video_redundancy::Model>> {
        VideoRedundancy::find()
            .filter(video_redundancy::Column::ActorId.eq(self.server_actor_id))
            .filter(Expr::cust_with_values(
                concat!(
                    r#""videoRedundancy"."videoStreamingPlaylistId" IN ("#,
                    r#"SELECT "videoStreamingPlaylist"."id" FROM "videoStreamingPlaylist" "#,
                    r#"INNER JOIN "video" ON "video"."id" = "videoStreamingPlaylist"."videoId" "#,
                    r#"INNER JOIN "videoChannel" ON "videoChannel"."id" = "video"."channelId" "#,
                    r#"INNER JOIN "actor" ON "actor"."id" = "videoChannel"."actorId" "#,
                    r#"WHERE "actor"."serverId" = $1)"#
                ),
                [server_id],
            ))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Stats ====================

    /// Storage used by our redundancies of `strategy`.
    pub async fn get_stats(&self, strategy: &str) -> AppResult<RedundancyStats> {
        let sql = concat!(
            r#"WITH "tmp" AS ("#,
            r#"SELECT "videoStreamingFile"."size" AS "videoStreamingFileSize", "videoStreamingPlaylist"."videoId" AS "videoStreamingVideoId" "#,
            r#"FROM "videoRedundancy" AS "videoRedundancy" "#,
            r#"LEFT JOIN "videoStreamingPlaylist" ON "videoRedundancy"."videoStreamingPlaylistId" = "videoStreamingPlaylist"."id" "#,
            r#"LEFT JOIN "videoFile" AS "videoStreamingFile" ON "videoStreamingPlaylist"."id" = "videoStreamingFile"."videoStreamingPlaylistId" "#,
            r#"WHERE "videoRedundancy"."strategy" = $1 AND "videoRedundancy"."actorId" = $2) "#,
            r#"SELECT COALESCE(SUM("videoStreamingFileSize"), 0)::bigint AS "total_used", "#,
            r#"COUNT(DISTINCT "videoStreamingVideoId") AS "total_videos", "#,
            r#"COUNT(*) AS "total_video_files" FROM "tmp""#
        );

        let stats = RedundancyStats::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [strategy.into(), self.server_actor_id.into()],
        ))
        .one(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(stats.unwrap_or(RedundancyStats {
            total_used: 0,
            total_videos: 0,
            total_video_files: 0,
        }))
    }

    // ==================== Writes ====================

    /// Record a redundancy.
    ///
    /// Fails with a conflict when another redundancy already uses the same url.
    pub async fn create(&self, input: NewVideoRedundancy) -> AppResult<video_redundancy::Model> {
        let now = Utc::now();

        let active_model = video_redundancy::ActiveModel {
            expires_on: Set(input.expires_on.map(Into::into)),
            file_url: Set(input.file_url),
            url: Set(input.url.clone()),
            strategy: Set(input.strategy),
            actor_id: Set(input.actor_id),
            video_streaming_playlist_id: Set(input.video_streaming_playlist_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        active_model.insert(self.db.as_ref()).await.map_err(|e| {
            if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
                AppError::Conflict(format!("Redundancy already exists: {}", input.url))
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Push the expiration date of a redundancy to `lifetime` from now.
    pub async fn extend_expiration(
        &self,
        redundancy: video_redundancy::Model,
        lifetime: Duration,
    ) -> AppResult<video_redundancy::Model> {
        let now = Utc::now();
        let expires_on = shift_date(now, lifetime, true)?;

        let mut active: video_redundancy::ActiveModel = redundancy.into();
        active.expires_on = Set(Some(expires_on.into()));
        active.updated_at = Set(now.into());

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a redundancy, removing the cached files first when we own it.
    ///
    /// A failed file removal is logged and does not prevent the deletion.
    pub async fn destroy(&self, entry: &RedundancyWithVideo) -> AppResult<()> {
        if entry.redundancy.is_owned() {
            if let Some(remover) = &self.file_remover {
                tracing::info!(video = %entry.video.uuid, "Removing duplicated video streaming playlist");

                if let Err(e) = remover
                    .remove_streaming_playlist_files(&entry.video, &entry.streaming_playlist)
                    .await
                {
                    tracing::error!(error = %e, video = %entry.video.uuid, "Cannot delete video streaming playlist files");
                }
            }
        }

        VideoRedundancy::delete_by_id(entry.redundancy.id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // ==================== Helpers ====================

    async fn first_with_video(
        &self,
        redundancy: Option<video_redundancy::Model>,
    ) -> AppResult<Option<RedundancyWithVideo>> {
        match redundancy {
            Some(redundancy) => Ok(self.with_videos(vec![redundancy]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    /// Attach the playlist and video of each redundancy, dropping the orphans.
    async fn with_videos(
        &self,
        redundancies: Vec<video_redundancy::Model>,
    ) -> AppResult<Vec<RedundancyWithVideo>> {
        if redundancies.is_empty() {
            return Ok(Vec::new());
        }

        let playlist_ids: Vec<i32> = redundancies
            .iter()
            .map(|r| r.video_streaming_playlist_id)
            .collect();

        let playlists: HashMap<i32, video_streaming_playlist::Model> = VideoStreamingPlaylist::find()
            .filter(video_streaming_playlist::Column::Id.is_in(playlist_ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let video_ids: Vec<i32> = playlists.values().map(|p| p.video_id).collect();

        let videos: HashMap<i32, video::Model> = if video_ids.is_empty() {
            HashMap::new()
        } else {
            VideoEntity::find()
                .filter(video::Column::Id.is_in(video_ids))
                .all(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .into_iter()
                .map(|v| (v.id, v))
                .collect()
        };

        Ok(redundancies
            .into_iter()
            .filter_map(|redundancy| {
                let streaming_playlist = playlists.get(&redundancy.video_streaming_playlist_id)?.clone();
                let video = videos.get(&streaming_playlist.video_id)?.clone();

                Some(RedundancyWithVideo {
                    redundancy,
                    streaming_playlist,
                    video,
                })
            })
            .collect())
    }
}
