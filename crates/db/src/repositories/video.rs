//! Video repository.

use std::sync::Arc;

use peertube_common::{AppError, AppResult};
use sea_orm::DatabaseConnection;

use crate::models::{Video, VideoInclude};
use crate::query::SqlRow;
use crate::query::run_query::{BuiltQuery, run_query};
use crate::query::video::{
    BuildMode, GetVideoType, ListVideosOptions, VideoGetQueryBuilder, VideoListQueryBuilder,
    VideoLookup, VideoModelBuilder, VideoRows, VideoTableAttributes,
};

/// Repository loading materialized video graphs.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Load one video.
    pub async fn load(
        &self,
        lookup: VideoLookup,
        kind: GetVideoType,
        user_id: Option<i32>,
    ) -> AppResult<Option<Video>> {
        let queries = VideoGetQueryBuilder::new(lookup, kind)
            .for_user(user_id)
            .build();

        let rows = run_query(self.db.as_ref(), &queries.main).await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let web_video_files = self.run_optional(queries.web_video_files.as_ref()).await?;
        let streaming_playlists = self
            .run_optional(queries.streaming_playlist_files.as_ref())
            .await?;

        let videos = VideoModelBuilder::new(BuildMode::Get, &VideoTableAttributes::new(BuildMode::Get))
            .build_videos_from_rows(VideoRows {
                rows: &rows,
                include: VideoInclude::empty(),
                rows_web_video_files: web_video_files.as_deref(),
                rows_streaming_playlist: streaming_playlists.as_deref(),
            });

        videos
            .into_iter()
            .next()
            .map(Some)
            .ok_or_else(|| AppError::Database("Cannot decode the video row".to_string()))
    }

    /// Load a video with every web video file and streaming playlist.
    pub async fn load_with_files(&self, id: i32) -> AppResult<Option<Video>> {
        self.load(VideoLookup::Id(id), GetVideoType::AllFiles, None)
            .await
    }

    /// Load a page of videos, in the order of `options.ids`.
    pub async fn list_by_ids(&self, options: ListVideosOptions) -> AppResult<Vec<Video>> {
        if options.ids.is_empty() {
            return Ok(Vec::new());
        }

        let builder = VideoListQueryBuilder::new(options)?;
        let rows = run_query(self.db.as_ref(), &builder.build_query()).await?;

        let videos = VideoModelBuilder::new(BuildMode::List, &VideoTableAttributes::new(BuildMode::List))
            .build_videos_from_rows(VideoRows {
                include: builder.options().include,
                ..VideoRows::new(&rows)
            });

        Ok(videos)
    }

    async fn run_optional(&self, query: Option<&BuiltQuery>) -> AppResult<Option<Vec<SqlRow>>> {
        match query {
            Some(query) => run_query(self.db.as_ref(), query).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{MockRow, mock_row, video_fixture};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn test_load_with_files_merges_overflow_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![mock_row(video_fixture(5))]])
                .append_query_results([vec![mock_row(json!({
                    "id": 5,
                    "VideoFiles.id": 50,
                    "VideoFiles.resolution": 1080,
                    "VideoFiles.size": 4000,
                    "VideoFiles.extname": ".mp4",
                    "VideoFiles.filename": "50.mp4"
                }))]])
                .append_query_results([vec![mock_row(json!({
                    "id": 5,
                    "VideoStreamingPlaylists.id": 8,
                    "VideoStreamingPlaylists.type": 1,
                    "VideoStreamingPlaylists.videoId": 5,
                    "VideoStreamingPlaylists.playlistUrl": "https://remote.test/hls/master.m3u8",
                    "VideoStreamingPlaylists.VideoFiles.id": 51,
                    "VideoStreamingPlaylists.VideoFiles.resolution": 1080,
                    "VideoStreamingPlaylists.VideoFiles.size": 3000,
                    "VideoStreamingPlaylists.VideoFiles.extname": ".mp4",
                    "VideoStreamingPlaylists.VideoFiles.filename": "51-fragmented.mp4"
                }))]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db.clone());
        let video = repo.load_with_files(5).await.unwrap().unwrap();

        assert_eq!(video.id, 5);
        assert_eq!(video.video_files.len(), 1);
        assert_eq!(video.video_streaming_playlists[0].video_files[0].id, 51);
        assert_eq!(video.total_files_size(), 7000);

        drop(repo);
        let log = Arc::try_unwrap(db)
            .expect("repository dropped, connection uniquely owned")
            .into_transaction_log();
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn test_load_missing_video_runs_one_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<MockRow>::new()])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let video = repo
            .load(VideoLookup::Url("https://remote.test/v/1".into()), GetVideoType::Full, None)
            .await
            .unwrap();

        assert!(video.is_none());
    }

    #[tokio::test]
    async fn test_load_undecodable_video_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![mock_row(json!({ "id": 4, "uuid": "not-a-uuid" }))]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let err = repo
            .load(VideoLookup::Id(4), GetVideoType::Thumbnails, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_list_by_ids_keeps_row_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    mock_row(video_fixture(9)),
                    mock_row(video_fixture(2)),
                    mock_row(video_fixture(9)),
                ]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let videos = repo
            .list_by_ids(ListVideosOptions {
                ids: vec![9, 2],
                ..Default::default()
            })
            .await
            .unwrap();

        let ids: Vec<i32> = videos.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![9, 2]);
    }

    #[tokio::test]
    async fn test_list_by_no_ids_skips_the_database() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = VideoRepository::new(db);
        let videos = repo.list_by_ids(ListVideosOptions::default()).await.unwrap();

        assert!(videos.is_empty());
    }
}
