//! Video graph nodes.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::VideoChannel;

/// Video privacy levels.
pub mod video_privacy {
    /// Visible and listed.
    pub const PUBLIC: i32 = 1;
    /// Visible with the link only.
    pub const UNLISTED: i32 = 2;
    /// Owner only.
    pub const PRIVATE: i32 = 3;
    /// Local users only.
    pub const INTERNAL: i32 = 4;
    /// Password protected.
    pub const PASSWORD_PROTECTED: i32 = 5;
}

bitflags! {
    /// Optional parts of a video graph a list endpoint may request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct VideoInclude: u32 {
        const NOT_PUBLISHED_STATE = 1 << 0;
        const BLACKLISTED = 1 << 1;
        const BLOCKED_OWNER = 1 << 2;
        const FILES = 1 << 3;
        const CAPTIONS = 1 << 4;
        const SOURCE = 1 << 5;
        const AUTOMATIC_TAGS = 1 << 6;
    }
}

/// A fully materialized video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub category: Option<i32>,
    #[serde(default)]
    pub licence: Option<i32>,
    #[serde(default)]
    pub language: Option<String>,
    pub privacy: i32,
    pub nsfw: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub support: Option<String>,
    pub duration: i32,
    pub views: i32,
    pub likes: i32,
    pub dislikes: i32,
    pub remote: bool,
    pub is_live: bool,
    pub url: String,
    #[serde(default)]
    pub comments_policy: Option<i32>,
    #[serde(default)]
    pub download_enabled: Option<bool>,
    #[serde(default)]
    pub wait_transcoding: Option<bool>,
    pub state: i32,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub originally_published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub input_file_updated_at: Option<DateTime<Utc>>,
    pub channel_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub video_channel: Option<VideoChannel>,
    #[serde(default)]
    pub user_video_histories: Vec<UserVideoHistory>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
    #[serde(default)]
    pub video_streaming_playlists: Vec<VideoStreamingPlaylist>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub trackers: Vec<Tracker>,
    #[serde(default)]
    pub video_automatic_tags: Vec<VideoAutomaticTag>,
    #[serde(default)]
    pub video_blacklist: Option<VideoBlacklist>,
    #[serde(default)]
    pub schedule_video_update: Option<ScheduleVideoUpdate>,
    #[serde(default)]
    pub video_live: Option<VideoLive>,
    #[serde(default)]
    pub video_source: Option<VideoSource>,
}

impl Video {
    /// Streaming playlist by id.
    #[must_use]
    pub fn streaming_playlist(&self, id: i32) -> Option<&VideoStreamingPlaylist> {
        self.video_streaming_playlists.iter().find(|p| p.id == id)
    }

    /// Total size of every file of this video, web video and streaming.
    #[must_use]
    pub fn total_files_size(&self) -> i64 {
        let web: i64 = self.video_files.iter().map(|f| f.size).sum();
        let streaming: i64 = self
            .video_streaming_playlists
            .iter()
            .map(VideoStreamingPlaylist::total_files_size)
            .sum();

        web + streaming
    }
}

/// A thumbnail or preview image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: i32,
    pub filename: String,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub on_disk: Option<bool>,
    #[serde(default)]
    pub video_id: Option<i32>,
}

/// A web video file or a file of a streaming playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFile {
    pub id: i32,
    pub resolution: i32,
    pub size: i64,
    pub extname: String,
    pub filename: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub torrent_filename: Option<String>,
    #[serde(default)]
    pub torrent_url: Option<String>,
    #[serde(default)]
    pub info_hash: Option<String>,
    #[serde(default)]
    pub fps: Option<i32>,
    #[serde(default)]
    pub metadata_url: Option<String>,
    #[serde(default)]
    pub storage: Option<i32>,
    #[serde(default)]
    pub video_id: Option<i32>,
    #[serde(default)]
    pub video_streaming_playlist_id: Option<i32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub redundancy_videos: Vec<VideoRedundancy>,
}

/// An HLS streaming playlist and its files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStreamingPlaylist {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub playlist_url: Option<String>,
    #[serde(default)]
    pub playlist_filename: Option<String>,
    #[serde(default)]
    pub segments_sha256_filename: Option<String>,
    #[serde(default)]
    pub segments_sha256_url: Option<String>,
    #[serde(default)]
    pub p2p_media_loader_peer_version: Option<i32>,
    #[serde(default)]
    pub storage: Option<i32>,
    pub video_id: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub video_files: Vec<VideoFile>,
    #[serde(default)]
    pub redundancy_videos: Vec<VideoRedundancy>,
}

impl VideoStreamingPlaylist {
    /// Sum of the sizes of the playlist files.
    #[must_use]
    pub fn total_files_size(&self) -> i64 {
        self.video_files.iter().map(|f| f.size).sum()
    }
}

/// A redundancy record attached to a file or playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRedundancy {
    pub id: i32,
    pub file_url: String,
}

/// A video tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

/// A `BitTorrent` tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracker {
    pub id: i32,
    pub url: String,
}

/// An automatic tag scoped to the account that evaluated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAutomaticTag {
    pub video_id: i32,
    pub account_id: i32,
    pub automatic_tag_id: i32,

    #[serde(default)]
    pub automatic_tag: Option<AutomaticTag>,
}

/// An automatic tag label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomaticTag {
    pub id: i32,
    pub name: String,
}

/// A blacklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBlacklist {
    pub id: i32,
    #[serde(default)]
    pub reason: Option<String>,
    pub unfederated: bool,
}

/// A scheduled privacy update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleVideoUpdate {
    pub id: i32,
    pub update_at: DateTime<Utc>,
    #[serde(default)]
    pub privacy: Option<i32>,
    pub video_id: i32,
}

/// Live settings of a live video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLive {
    pub id: i32,
    #[serde(default)]
    pub stream_key: Option<String>,
    pub save_replay: bool,
    pub permanent_live: bool,
    #[serde(default)]
    pub latency_mode: Option<i32>,
    pub video_id: i32,
}

/// Upload source of a local video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    pub id: i32,
    #[serde(default)]
    pub input_filename: Option<String>,
    #[serde(default)]
    pub kept_original_filename: Option<String>,
}

/// Watch progress of the requesting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVideoHistory {
    pub id: i32,
    pub current_time: i32,
}
