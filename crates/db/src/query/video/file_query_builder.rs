//! Overflow queries fetching the files of single videos.
//!
//! Files and streaming playlists are loaded apart from the main video query
//! so the tag, tracker and thumbnail joins are not multiplied by the number
//! of files.

use super::query_parts::{VideoLookup, VideoQueryParts};
use super::table_attributes::BuildMode;
use crate::query::run_query::BuiltQuery;

/// Builds the web video file and streaming playlist queries of a lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoFileQueryBuilder {
    include_redundancy: bool,
}

impl VideoFileQueryBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_redundancy: false,
        }
    }

    /// Also project the redundancy records of every file and playlist.
    #[must_use]
    pub const fn with_redundancy(mut self) -> Self {
        self.include_redundancy = true;
        self
    }

    /// One row per web video file (and redundancy), keyed by `id` of the video.
    #[must_use]
    pub fn build_web_video_files_query(&self, lookup: &VideoLookup) -> BuiltQuery {
        let mut parts = VideoQueryParts::new(BuildMode::Get);

        parts.add_attribute(r#""video"."id" AS "id""#);
        parts.include_web_video_files(true);

        if self.include_redundancy {
            parts.include_web_video_redundancies();
        }

        parts.where_lookup(lookup);
        parts.into_query("")
    }

    /// One row per streaming playlist file (and redundancy), keyed by `id` of the video.
    #[must_use]
    pub fn build_streaming_playlist_files_query(&self, lookup: &VideoLookup) -> BuiltQuery {
        let mut parts = VideoQueryParts::new(BuildMode::Get);

        parts.add_attribute(r#""video"."id" AS "id""#);
        parts.include_streaming_playlist_files(true);

        if self.include_redundancy {
            parts.include_streaming_playlist_redundancies();
        }

        parts.where_lookup(lookup);
        parts.into_query("")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_web_video_files_query() {
        let query = VideoFileQueryBuilder::new().build_web_video_files_query(&VideoLookup::Id(4));

        assert!(query.sql.starts_with(r#"SELECT "video"."id" AS "id", "VideoFiles"."id" AS "VideoFiles.id""#));
        assert!(query.sql.contains(r#"INNER JOIN "videoFile" AS "VideoFiles""#));
        assert!(!query.sql.contains("videoRedundancy"));
        assert!(query.sql.ends_with(r#"WHERE "video"."id" = :videoId"#));
    }

    #[test]
    fn test_streaming_playlist_files_query_with_redundancy() {
        let query = VideoFileQueryBuilder::new()
            .with_redundancy()
            .build_streaming_playlist_files_query(&VideoLookup::Url("https://remote.test/v/1".into()));

        assert!(query.sql.contains(r#"INNER JOIN "videoStreamingPlaylist" AS "VideoStreamingPlaylists""#));
        assert!(query.sql.contains(r#"INNER JOIN "videoFile" AS "VideoStreamingPlaylists->VideoFiles""#));
        assert!(query.sql.contains(r#"AS "VideoStreamingPlaylists.RedundancyVideos.fileUrl""#));
        assert!(query.sql.ends_with(r#"WHERE "video"."url" = :videoUrl"#));

        let (sql, values) = crate::query::run_query::bind_named(&query.sql, &query.replacements).unwrap();
        assert!(sql.ends_with(r#""video"."url" = $1"#));
        assert_eq!(values.len(), 1);
    }
}
