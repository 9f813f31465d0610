//! Queries loading one video.

use super::file_query_builder::VideoFileQueryBuilder;
use super::query_parts::{VideoLookup, VideoQueryParts};
use super::table_attributes::BuildMode;
use crate::query::run_query::BuiltQuery;

/// How much of a single video to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GetVideoType {
    /// Channel, account, thumbnails, tags, trackers, blacklist, schedule,
    /// live, the viewer's history, and files with their redundancies.
    #[default]
    Full,
    /// The video columns and every file.
    AllFiles,
    Thumbnails,
    ThumbnailsBlacklist,
    /// Channel, account, thumbnails, blacklist and files.
    AccountBlacklist,
}

impl GetVideoType {
    const fn includes_files(self) -> bool {
        matches!(self, Self::Full | Self::AllFiles | Self::AccountBlacklist)
    }

    const fn includes_owner(self) -> bool {
        matches!(self, Self::Full | Self::AccountBlacklist)
    }

    const fn includes_thumbnails(self) -> bool {
        !matches!(self, Self::AllFiles)
    }

    const fn includes_blacklist(self) -> bool {
        matches!(
            self,
            Self::Full | Self::ThumbnailsBlacklist | Self::AccountBlacklist
        )
    }
}

/// The main row query of a video and its optional file overflow queries.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoQueries {
    pub main: BuiltQuery,
    pub web_video_files: Option<BuiltQuery>,
    pub streaming_playlist_files: Option<BuiltQuery>,
}

/// Builds the queries of a single video fetch.
#[derive(Debug, Clone)]
pub struct VideoGetQueryBuilder {
    lookup: VideoLookup,
    kind: GetVideoType,
    user_id: Option<i32>,
}

impl VideoGetQueryBuilder {
    #[must_use]
    pub const fn new(lookup: VideoLookup, kind: GetVideoType) -> Self {
        Self {
            lookup,
            kind,
            user_id: None,
        }
    }

    /// Attach the watch history of this user.
    #[must_use]
    pub const fn for_user(mut self, user_id: Option<i32>) -> Self {
        self.user_id = user_id;
        self
    }

    #[must_use]
    pub fn build(&self) -> VideoQueries {
        let (web_video_files, streaming_playlist_files) = if self.kind.includes_files() {
            let mut files = VideoFileQueryBuilder::new();
            if self.kind == GetVideoType::Full {
                files = files.with_redundancy();
            }

            (
                Some(files.build_web_video_files_query(&self.lookup)),
                Some(files.build_streaming_playlist_files_query(&self.lookup)),
            )
        } else {
            (None, None)
        };

        VideoQueries {
            main: self.build_main_query(),
            web_video_files,
            streaming_playlist_files,
        }
    }

    fn build_main_query(&self) -> BuiltQuery {
        let mut parts = VideoQueryParts::new(BuildMode::Get);
        parts.include_video_attributes();

        if self.kind.includes_owner() {
            parts.include_channels();
            parts.include_accounts();
        }

        if self.kind.includes_thumbnails() {
            parts.include_thumbnails();
        }

        if self.kind.includes_blacklist() {
            parts.include_blacklisted();
        }

        if self.kind == GetVideoType::Full {
            parts.include_tags();
            parts.include_trackers();
            parts.include_schedule_update();
            parts.include_live();

            if let Some(user_id) = self.user_id {
                parts.include_user_history(user_id);
            }
        }

        parts.where_lookup(&self.lookup);
        parts.into_query("")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::Value;

    #[test]
    fn test_full_query() {
        let queries = VideoGetQueryBuilder::new(VideoLookup::Id(7), GetVideoType::Full)
            .for_user(Some(3))
            .build();

        let sql = &queries.main.sql;
        assert!(sql.starts_with(r#"SELECT "video"."id", "video"."uuid""#));
        assert!(sql.contains(r#"INNER JOIN "account" AS "VideoChannel->Account""#));
        assert!(sql.contains(r#""Tags->VideoTagModel""#));
        assert!(sql.contains(r#""Trackers->VideoTrackerModel""#));
        assert!(sql.contains(r#""VideoLive""#));
        assert!(sql.contains(r#""userVideoHistory"."userId" = :userVideoHistoryId"#));
        assert!(!sql.contains("videoFile"));
        assert_eq!(
            queries.main.replacements.get("userVideoHistoryId"),
            Some(&Value::from(3))
        );

        let files = queries.web_video_files.unwrap();
        assert!(files.sql.contains(r#""VideoFiles->RedundancyVideos""#));
        assert!(queries.streaming_playlist_files.is_some());
    }

    #[test]
    fn test_light_queries() {
        let queries = VideoGetQueryBuilder::new(VideoLookup::Id(7), GetVideoType::Thumbnails).build();

        assert!(queries.web_video_files.is_none());
        assert!(queries.streaming_playlist_files.is_none());
        assert!(queries.main.sql.contains(r#""Thumbnails""#));
        assert!(!queries.main.sql.contains("VideoChannel"));
        assert!(!queries.main.sql.contains("videoBlacklist"));

        let queries = VideoGetQueryBuilder::new(VideoLookup::Id(7), GetVideoType::AllFiles).build();
        assert!(!queries.main.sql.contains(r#""Thumbnails""#));

        let files = queries.web_video_files.unwrap();
        assert!(!files.sql.contains("videoRedundancy"));
    }

    #[test]
    fn test_history_needs_a_user() {
        let queries = VideoGetQueryBuilder::new(VideoLookup::Id(7), GetVideoType::Full).build();

        assert!(!queries.main.sql.contains("userVideoHistory"));
    }
}
