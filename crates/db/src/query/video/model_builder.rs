//! Folds flattened video rows into video graphs.
//!
//! The primary rows carry one row per combination of joined collection items.
//! Files and streaming playlists may instead come in separate overflow row
//! sets, merged into the same videos after the primary pass.

use std::collections::HashMap;

use super::table_attributes::{BuildMode, VideoTableAttributes};
use crate::models::{
    Account, Actor, ActorImage, AutomaticTag, Blocklist, ScheduleVideoUpdate, Server, Tag,
    Thumbnail, Tracker, UserVideoHistory, Video, VideoAutomaticTag, VideoBlacklist, VideoChannel,
    VideoFile, VideoInclude, VideoLive, VideoRedundancy, VideoSource, VideoStreamingPlaylist,
};
use crate::query::row::{JoinSpec, RowFolder, SqlRow, decode, row_id, row_key};

const USER_HISTORY: JoinSpec =
    JoinSpec::by_id("UserVideoHistories", "userVideoHistory", "userVideoHistory.id");

const THUMBNAILS: JoinSpec = JoinSpec::by_id("Thumbnails", "Thumbnails", "Thumbnails.id");

const CHANNEL_AVATARS: JoinSpec = JoinSpec::by_id(
    "ChannelActorImages",
    "VideoChannel.Actor.Avatars",
    "VideoChannel.Actor.Avatars.id",
)
.per_root();

const ACCOUNT_AVATARS: JoinSpec = JoinSpec::by_id(
    "AccountActorImages",
    "VideoChannel.Account.Actor.Avatars",
    "VideoChannel.Account.Actor.Avatars.id",
)
.per_root();

const TAGS: JoinSpec = JoinSpec::by_composite(
    "Tags",
    "Tags",
    "Tags.name",
    &["Tags.VideoTagModel.videoId", "Tags.VideoTagModel.tagId"],
);

const TRACKERS: JoinSpec = JoinSpec::by_composite(
    "Trackers",
    "Trackers",
    "Trackers.id",
    &[
        "Trackers.VideoTrackerModel.videoId",
        "Trackers.VideoTrackerModel.trackerId",
    ],
);

const AUTOMATIC_TAGS: JoinSpec = JoinSpec::by_composite(
    "VideoAutomaticTags",
    "VideoAutomaticTags",
    "VideoAutomaticTags.AutomaticTag.id",
    &[
        "VideoAutomaticTags.videoId",
        "VideoAutomaticTags.accountId",
        "VideoAutomaticTags.automaticTagId",
    ],
);

const BLACKLIST: JoinSpec = JoinSpec::by_id("VideoBlacklist", "VideoBlacklist", "VideoBlacklist.id");

const SCHEDULE_UPDATE: JoinSpec = JoinSpec::by_id(
    "ScheduleVideoUpdate",
    "ScheduleVideoUpdate",
    "ScheduleVideoUpdate.id",
);

const LIVE: JoinSpec = JoinSpec::by_id("VideoLive", "VideoLive", "VideoLive.id");

const SOURCE: JoinSpec = JoinSpec::by_id("VideoSource", "VideoSource", "VideoSource.id");

const ACCOUNT_BLOCKLIST: JoinSpec = JoinSpec::by_id(
    "AccountBlocklist",
    "VideoChannel.Account.AccountBlocklist",
    "VideoChannel.Account.AccountBlocklist.id",
)
.per_root();

const SERVER_BLOCKLIST: JoinSpec = JoinSpec::by_id(
    "ServerBlocklist",
    "VideoChannel.Account.Actor.Server.ServerBlocklist",
    "VideoChannel.Account.Actor.Server.ServerBlocklist.id",
)
.per_root();

const WEB_VIDEO_FILE_REDUNDANCIES: JoinSpec = JoinSpec::by_id(
    "RedundancyVideos",
    "VideoFiles.RedundancyVideos",
    "VideoFiles.RedundancyVideos.id",
);

const STREAMING_PLAYLIST_REDUNDANCIES: JoinSpec = JoinSpec::by_id(
    "RedundancyVideos",
    "VideoStreamingPlaylists.RedundancyVideos",
    "VideoStreamingPlaylists.RedundancyVideos.id",
);

/// Rows to fold, and which optional parts they carry.
#[derive(Debug, Clone, Copy)]
pub struct VideoRows<'a> {
    pub rows: &'a [SqlRow],
    pub include: VideoInclude,
    /// Web video files fetched apart. When absent they are read from `rows`.
    pub rows_web_video_files: Option<&'a [SqlRow]>,
    /// Streaming playlist files fetched apart. When absent they are read from `rows`.
    pub rows_streaming_playlist: Option<&'a [SqlRow]>,
}

impl<'a> VideoRows<'a> {
    /// Primary rows only.
    #[must_use]
    pub const fn new(rows: &'a [SqlRow]) -> Self {
        Self {
            rows,
            include: VideoInclude::empty(),
            rows_web_video_files: None,
            rows_streaming_playlist: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FileLocation {
    Web {
        video: usize,
        file: usize,
    },
    Playlist {
        video: usize,
        playlist: usize,
        file: usize,
    },
}

/// One-shot materializer for a set of video rows.
#[derive(Debug)]
pub struct VideoModelBuilder {
    mode: BuildMode,
    tables: VideoTableAttributes,
    folder: RowFolder,
    videos_memo: HashMap<i32, usize>,
    playlists_memo: HashMap<i32, (usize, usize)>,
    files_memo: HashMap<i32, FileLocation>,
    videos: Vec<Video>,
}

impl VideoModelBuilder {
    #[must_use]
    pub fn new(mode: BuildMode, tables: &VideoTableAttributes) -> Self {
        Self {
            mode,
            tables: *tables,
            folder: RowFolder::new(),
            videos_memo: HashMap::new(),
            playlists_memo: HashMap::new(),
            files_memo: HashMap::new(),
            videos: Vec::new(),
        }
    }

    /// Build the videos, in order of first appearance in the primary rows.
    #[must_use]
    pub fn build_videos_from_rows(mut self, input: VideoRows<'_>) -> Vec<Video> {
        for row in input.rows {
            let Some(index) = self.build_video_and_account(row) else {
                continue;
            };

            self.add_avatars(row, index);
            self.set_user_history(row, index);
            self.add_thumbnail(row, index);

            if input.rows_web_video_files.is_none() {
                self.add_web_video_file(row, index);
            }

            if input.rows_streaming_playlist.is_none() {
                self.add_streaming_playlist(row, index);
                self.add_streaming_playlist_file(row);
            }

            match self.mode {
                BuildMode::Get => {
                    self.add_tag(row, index);
                    self.add_tracker(row, index);
                    self.set_blacklisted(row, index);
                    self.set_schedule_video_update(row, index);
                    self.set_live(row, index);
                }
                BuildMode::List => {
                    if input.include.contains(VideoInclude::BLACKLISTED) {
                        self.set_blacklisted(row, index);
                    }

                    if input.include.contains(VideoInclude::BLOCKED_OWNER) {
                        self.set_blocked_owner(row, index);
                        self.set_blocked_server(row, index);
                    }

                    if input.include.contains(VideoInclude::SOURCE) {
                        self.set_source(row, index);
                    }

                    if input.include.contains(VideoInclude::AUTOMATIC_TAGS) {
                        self.add_automatic_tag(row, index);
                    }
                }
            }
        }

        if let Some(rows) = input.rows_web_video_files {
            self.grab_separate_web_video_files(rows);
        }

        if let Some(rows) = input.rows_streaming_playlist {
            self.grab_separate_streaming_playlist_files(rows);
        }

        self.videos
    }

    fn grab_separate_web_video_files(&mut self, rows: &[SqlRow]) {
        for row in rows {
            let Some(file_id) = row_id(row, "VideoFiles.id") else {
                continue;
            };
            let Some(index) = self.memoized_video(row) else {
                continue;
            };

            self.add_web_video_file(row, index);

            let Some(location) = self.files_memo.get(&file_id).copied() else {
                continue;
            };
            let Some(redundancy) = self.take_redundancy(row, &WEB_VIDEO_FILE_REDUNDANCIES) else {
                continue;
            };

            if let Some(file) = self.file_mut(location) {
                file.redundancy_videos.push(redundancy);
            }
        }
    }

    fn grab_separate_streaming_playlist_files(&mut self, rows: &[SqlRow]) {
        for row in rows {
            let Some(playlist_id) = row_id(row, "VideoStreamingPlaylists.id") else {
                continue;
            };
            let Some(index) = self.memoized_video(row) else {
                continue;
            };

            self.add_streaming_playlist(row, index);
            self.add_streaming_playlist_file(row);

            let Some((video, playlist)) = self.playlists_memo.get(&playlist_id).copied() else {
                continue;
            };
            let Some(redundancy) = self.take_redundancy(row, &STREAMING_PLAYLIST_REDUNDANCIES)
            else {
                continue;
            };

            self.videos[video].video_streaming_playlists[playlist]
                .redundancy_videos
                .push(redundancy);
        }
    }

    fn memoized_video(&self, row: &SqlRow) -> Option<usize> {
        let id = row_id(row, "id")?;
        self.videos_memo.get(&id).copied()
    }

    fn build_video_and_account(&mut self, row: &SqlRow) -> Option<usize> {
        let id = row_id(row, "id")?;

        if let Some(index) = self.videos_memo.get(&id) {
            return Some(*index);
        }

        let mut video: Video = decode(row, self.tables.video(), "")?;
        video.video_channel = self.build_channel(row);

        let index = self.videos.len();
        self.videos.push(video);
        self.videos_memo.insert(id, index);

        Some(index)
    }

    fn build_channel(&self, row: &SqlRow) -> Option<VideoChannel> {
        row_key(row, "VideoChannel.Account.id")?;

        let mut channel: VideoChannel = decode(row, self.tables.channel(), "VideoChannel")?;
        channel.actor = self.build_actor(row, "VideoChannel");

        let mut account: Account =
            decode(row, self.tables.account(), "VideoChannel.Account")?;
        account.actor = self.build_actor(row, "VideoChannel.Account");

        channel.account = Some(account);

        Some(channel)
    }

    fn build_actor(&self, row: &SqlRow, prefix: &str) -> Option<Actor> {
        let actor_prefix = format!("{prefix}.Actor");
        let server_prefix = format!("{actor_prefix}.Server");

        row_key(row, &format!("{actor_prefix}.id"))?;

        let mut actor: Actor = decode(row, self.tables.actor(), &actor_prefix)?;

        if row_key(row, &format!("{server_prefix}.id")).is_some() {
            actor.server = decode::<Server>(row, self.tables.server(), &server_prefix);
        }

        Some(actor)
    }

    fn add_avatars(&mut self, row: &SqlRow, index: usize) {
        let avatars = self.tables.avatar();

        if let Some(avatar) = self.folder.take::<ActorImage>(row, &CHANNEL_AVATARS, avatars) {
            let actor = self.videos[index]
                .video_channel
                .as_mut()
                .and_then(|channel| channel.actor.as_mut());

            if let Some(actor) = actor {
                actor.avatars.push(avatar);
            }
        }

        if let Some(avatar) = self.folder.take::<ActorImage>(row, &ACCOUNT_AVATARS, avatars) {
            if let Some(actor) = self.account_mut(index).and_then(|a| a.actor.as_mut()) {
                actor.avatars.push(avatar);
            }
        }
    }

    fn set_user_history(&mut self, row: &SqlRow, index: usize) {
        if let Some(history) =
            self.folder
                .take::<UserVideoHistory>(row, &USER_HISTORY, self.tables.user_history())
        {
            self.videos[index].user_video_histories.push(history);
        }
    }

    fn add_thumbnail(&mut self, row: &SqlRow, index: usize) {
        if let Some(thumbnail) =
            self.folder
                .take::<Thumbnail>(row, &THUMBNAILS, self.tables.thumbnail())
        {
            self.videos[index].thumbnails.push(thumbnail);
        }
    }

    fn add_web_video_file(&mut self, row: &SqlRow, index: usize) {
        let Some(id) = row_id(row, "VideoFiles.id") else {
            return;
        };
        if self.files_memo.contains_key(&id) {
            return;
        }

        let Some(file) = decode::<VideoFile>(row, self.tables.file(), "VideoFiles") else {
            return;
        };

        let files = &mut self.videos[index].video_files;
        files.push(file);

        self.files_memo.insert(
            id,
            FileLocation::Web {
                video: index,
                file: files.len() - 1,
            },
        );
    }

    fn add_streaming_playlist(&mut self, row: &SqlRow, index: usize) {
        let Some(id) = row_id(row, "VideoStreamingPlaylists.id") else {
            return;
        };
        if self.playlists_memo.contains_key(&id) {
            return;
        }

        let Some(playlist) = decode::<VideoStreamingPlaylist>(
            row,
            self.tables.streaming_playlist(),
            "VideoStreamingPlaylists",
        ) else {
            return;
        };

        let playlists = &mut self.videos[index].video_streaming_playlists;
        playlists.push(playlist);

        self.playlists_memo.insert(id, (index, playlists.len() - 1));
    }

    fn add_streaming_playlist_file(&mut self, row: &SqlRow) {
        let Some(id) = row_id(row, "VideoStreamingPlaylists.VideoFiles.id") else {
            return;
        };
        if self.files_memo.contains_key(&id) {
            return;
        }

        let Some((video, playlist)) = row_id(row, "VideoStreamingPlaylists.id")
            .and_then(|playlist_id| self.playlists_memo.get(&playlist_id).copied())
        else {
            return;
        };

        let Some(file) = decode::<VideoFile>(
            row,
            self.tables.file(),
            "VideoStreamingPlaylists.VideoFiles",
        ) else {
            return;
        };

        let files = &mut self.videos[video].video_streaming_playlists[playlist].video_files;
        files.push(file);

        self.files_memo.insert(
            id,
            FileLocation::Playlist {
                video,
                playlist,
                file: files.len() - 1,
            },
        );
    }

    fn take_redundancy(&mut self, row: &SqlRow, spec: &JoinSpec) -> Option<VideoRedundancy> {
        self.folder.take(row, spec, self.tables.redundancy())
    }

    fn add_tag(&mut self, row: &SqlRow, index: usize) {
        if let Some(tag) = self.folder.take::<Tag>(row, &TAGS, self.tables.tag()) {
            self.videos[index].tags.push(tag);
        }
    }

    fn add_tracker(&mut self, row: &SqlRow, index: usize) {
        if let Some(tracker) = self.folder.take::<Tracker>(row, &TRACKERS, self.tables.tracker()) {
            self.videos[index].trackers.push(tracker);
        }
    }

    fn add_automatic_tag(&mut self, row: &SqlRow, index: usize) {
        let Some(mut tag) = self.folder.take::<VideoAutomaticTag>(
            row,
            &AUTOMATIC_TAGS,
            self.tables.video_automatic_tag(),
        ) else {
            return;
        };

        tag.automatic_tag = decode::<AutomaticTag>(
            row,
            self.tables.automatic_tag(),
            "VideoAutomaticTags.AutomaticTag",
        );
        self.videos[index].video_automatic_tags.push(tag);
    }

    fn set_blacklisted(&mut self, row: &SqlRow, index: usize) {
        if let Some(blacklist) =
            self.folder
                .take::<VideoBlacklist>(row, &BLACKLIST, self.tables.blacklisted())
        {
            self.videos[index].video_blacklist = Some(blacklist);
        }
    }

    fn set_blocked_owner(&mut self, row: &SqlRow, index: usize) {
        let Some(entry) =
            self.folder
                .take::<Blocklist>(row, &ACCOUNT_BLOCKLIST, self.tables.blocklist())
        else {
            return;
        };

        if let Some(account) = self.account_mut(index) {
            account.blocked_by.push(entry);
        }
    }

    fn set_blocked_server(&mut self, row: &SqlRow, index: usize) {
        let Some(entry) =
            self.folder
                .take::<Blocklist>(row, &SERVER_BLOCKLIST, self.tables.blocklist())
        else {
            return;
        };

        let server = self
            .account_mut(index)
            .and_then(|account| account.actor.as_mut())
            .and_then(|actor| actor.server.as_mut());

        if let Some(server) = server {
            server.blocked_by.push(entry);
        }
    }

    fn set_schedule_video_update(&mut self, row: &SqlRow, index: usize) {
        if let Some(schedule) = self.folder.take::<ScheduleVideoUpdate>(
            row,
            &SCHEDULE_UPDATE,
            self.tables.schedule_update(),
        ) {
            self.videos[index].schedule_video_update = Some(schedule);
        }
    }

    fn set_live(&mut self, row: &SqlRow, index: usize) {
        if let Some(live) = self.folder.take::<VideoLive>(row, &LIVE, self.tables.live()) {
            self.videos[index].video_live = Some(live);
        }
    }

    fn set_source(&mut self, row: &SqlRow, index: usize) {
        if let Some(source) =
            self.folder
                .take::<VideoSource>(row, &SOURCE, self.tables.video_source())
        {
            self.videos[index].video_source = Some(source);
        }
    }

    fn account_mut(&mut self, index: usize) -> Option<&mut Account> {
        self.videos[index]
            .video_channel
            .as_mut()
            .and_then(|channel| channel.account.as_mut())
    }

    fn file_mut(&mut self, location: FileLocation) -> Option<&mut VideoFile> {
        match location {
            FileLocation::Web { video, file } => self.videos.get_mut(video)?.video_files.get_mut(file),
            FileLocation::Playlist {
                video,
                playlist,
                file,
            } => self
                .videos
                .get_mut(video)?
                .video_streaming_playlists
                .get_mut(playlist)?
                .video_files
                .get_mut(file),
        }
    }
}
