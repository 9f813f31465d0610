//! Columns projected by the video queries, per joined table.
//!
//! Single video fetches (`Get`) project a few more actor, channel and server
//! columns than list pages.

#![allow(missing_docs)]

/// Whether a query fetches one video or a page of videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Get,
    List,
}

const VIDEO: &[&str] = &[
    "id",
    "uuid",
    "name",
    "category",
    "licence",
    "language",
    "privacy",
    "nsfw",
    "description",
    "support",
    "duration",
    "views",
    "likes",
    "dislikes",
    "remote",
    "isLive",
    "url",
    "commentsPolicy",
    "downloadEnabled",
    "waitTranscoding",
    "state",
    "publishedAt",
    "originallyPublishedAt",
    "inputFileUpdatedAt",
    "channelId",
    "createdAt",
    "updatedAt",
];

const CHANNEL_LIST: &[&str] = &["id", "name", "description", "actorId"];
const CHANNEL_GET: &[&str] = &["id", "name", "description", "actorId", "accountId"];

const ACCOUNT: &[&str] = &["id", "name", "actorId"];

const ACTOR_LIST: &[&str] = &["id", "preferredUsername", "url", "serverId"];
const ACTOR_GET: &[&str] = &[
    "id",
    "preferredUsername",
    "url",
    "serverId",
    "followersCount",
    "followingCount",
    "inboxUrl",
    "sharedInboxUrl",
];

const SERVER_LIST: &[&str] = &["id", "host"];
const SERVER_GET: &[&str] = &["id", "host", "redundancyAllowed"];

const AVATAR: &[&str] = &[
    "id",
    "width",
    "filename",
    "fileUrl",
    "onDisk",
    "createdAt",
    "updatedAt",
];

const THUMBNAIL: &[&str] = &[
    "id", "type", "filename", "height", "width", "fileUrl", "onDisk", "videoId",
];

const FILE: &[&str] = &[
    "id",
    "resolution",
    "size",
    "extname",
    "filename",
    "fileUrl",
    "torrentFilename",
    "torrentUrl",
    "infoHash",
    "fps",
    "metadataUrl",
    "storage",
    "videoId",
    "videoStreamingPlaylistId",
    "createdAt",
    "updatedAt",
];

const STREAMING_PLAYLIST: &[&str] = &[
    "id",
    "type",
    "playlistUrl",
    "playlistFilename",
    "segmentsSha256Filename",
    "segmentsSha256Url",
    "p2pMediaLoaderPeerVersion",
    "storage",
    "videoId",
    "createdAt",
    "updatedAt",
];

const TAG: &[&str] = &["id", "name"];
const VIDEO_TAG: &[&str] = &["videoId", "tagId"];

const TRACKER: &[&str] = &["id", "url"];
const VIDEO_TRACKER: &[&str] = &["videoId", "trackerId"];

const VIDEO_AUTOMATIC_TAG: &[&str] = &["videoId", "accountId", "automaticTagId"];
const AUTOMATIC_TAG: &[&str] = &["id", "name"];

const BLACKLIST: &[&str] = &["id", "reason", "unfederated"];
const BLOCKLIST: &[&str] = &["id"];

const SCHEDULE_UPDATE: &[&str] = &["id", "updateAt", "privacy", "videoId"];
const LIVE: &[&str] = &[
    "id",
    "streamKey",
    "saveReplay",
    "permanentLive",
    "latencyMode",
    "videoId",
];
const VIDEO_SOURCE: &[&str] = &["id", "inputFilename", "keptOriginalFilename"];

const REDUNDANCY: &[&str] = &["id", "fileUrl"];
const USER_HISTORY: &[&str] = &["id", "currentTime"];

/// Column lists of every table a video query may join.
#[derive(Debug, Clone, Copy)]
pub struct VideoTableAttributes {
    mode: BuildMode,
}

impl VideoTableAttributes {
    /// Column lists for `mode`.
    #[must_use]
    pub const fn new(mode: BuildMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> BuildMode {
        self.mode
    }

    #[must_use]
    pub const fn video(&self) -> &'static [&'static str] {
        VIDEO
    }

    #[must_use]
    pub const fn channel(&self) -> &'static [&'static str] {
        match self.mode {
            BuildMode::Get => CHANNEL_GET,
            BuildMode::List => CHANNEL_LIST,
        }
    }

    #[must_use]
    pub const fn account(&self) -> &'static [&'static str] {
        ACCOUNT
    }

    #[must_use]
    pub const fn actor(&self) -> &'static [&'static str] {
        match self.mode {
            BuildMode::Get => ACTOR_GET,
            BuildMode::List => ACTOR_LIST,
        }
    }

    #[must_use]
    pub const fn server(&self) -> &'static [&'static str] {
        match self.mode {
            BuildMode::Get => SERVER_GET,
            BuildMode::List => SERVER_LIST,
        }
    }

    #[must_use]
    pub const fn avatar(&self) -> &'static [&'static str] {
        AVATAR
    }

    #[must_use]
    pub const fn thumbnail(&self) -> &'static [&'static str] {
        THUMBNAIL
    }

    #[must_use]
    pub const fn file(&self) -> &'static [&'static str] {
        FILE
    }

    #[must_use]
    pub const fn streaming_playlist(&self) -> &'static [&'static str] {
        STREAMING_PLAYLIST
    }

    #[must_use]
    pub const fn tag(&self) -> &'static [&'static str] {
        TAG
    }

    #[must_use]
    pub const fn video_tag(&self) -> &'static [&'static str] {
        VIDEO_TAG
    }

    #[must_use]
    pub const fn tracker(&self) -> &'static [&'static str] {
        TRACKER
    }

    #[must_use]
    pub const fn video_tracker(&self) -> &'static [&'static str] {
        VIDEO_TRACKER
    }

    #[must_use]
    pub const fn video_automatic_tag(&self) -> &'static [&'static str] {
        VIDEO_AUTOMATIC_TAG
    }

    #[must_use]
    pub const fn automatic_tag(&self) -> &'static [&'static str] {
        AUTOMATIC_TAG
    }

    #[must_use]
    pub const fn blacklisted(&self) -> &'static [&'static str] {
        BLACKLIST
    }

    #[must_use]
    pub const fn blocklist(&self) -> &'static [&'static str] {
        BLOCKLIST
    }

    #[must_use]
    pub const fn schedule_update(&self) -> &'static [&'static str] {
        SCHEDULE_UPDATE
    }

    #[must_use]
    pub const fn live(&self) -> &'static [&'static str] {
        LIVE
    }

    #[must_use]
    pub const fn video_source(&self) -> &'static [&'static str] {
        VIDEO_SOURCE
    }

    #[must_use]
    pub const fn redundancy(&self) -> &'static [&'static str] {
        REDUNDANCY
    }

    #[must_use]
    pub const fn user_history(&self) -> &'static [&'static str] {
        USER_HISTORY
    }
}
