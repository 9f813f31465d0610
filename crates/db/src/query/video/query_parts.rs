//! Join and projection blocks shared by the video queries.
//!
//! Each `include_*` method appends the joins of one relation and projects its
//! columns under the dotted alias the materializer reads. A fresh
//! [`VideoQueryParts`] is created for every query built.

use sea_orm::Value;
use uuid::Uuid;

use super::table_attributes::{BuildMode, VideoTableAttributes};
use crate::models::actor_image_type;
use crate::query::run_query::{BuiltQuery, Replacements, build_select_attributes, create_safe_in};

/// How the videos of a query are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoLookup {
    Id(i32),
    Uuid(Uuid),
    Url(String),
    Ids(Vec<i32>),
}

/// Accumulated select list, joins and replacements of one video query.
#[derive(Debug)]
pub struct VideoQueryParts {
    tables: VideoTableAttributes,
    attributes: Vec<String>,
    joins: Vec<String>,
    replacements: Replacements,
    where_clause: String,
}

impl VideoQueryParts {
    /// Empty query parts using the column lists of `mode`.
    #[must_use]
    pub const fn new(mode: BuildMode) -> Self {
        Self {
            tables: VideoTableAttributes::new(mode),
            attributes: Vec::new(),
            joins: Vec::new(),
            replacements: Replacements::new(),
            where_clause: String::new(),
        }
    }

    /// Column lists in use.
    #[must_use]
    pub const fn tables(&self) -> &VideoTableAttributes {
        &self.tables
    }

    /// Project a raw SQL expression.
    pub fn add_attribute(&mut self, expression: impl Into<String>) {
        let expression = expression.into();

        if !self.attributes.contains(&expression) {
            self.attributes.push(expression);
        }
    }

    /// Project the columns of the `video` table under their own names.
    pub fn include_video_attributes(&mut self) {
        for attribute in self.tables.video() {
            self.add_attribute(format!(r#""video"."{attribute}""#));
        }
    }

    pub fn add_join(&mut self, join: impl Into<String>) {
        self.joins.push(join.into());
    }

    pub fn replace(&mut self, name: &str, value: impl Into<Value>) {
        self.replacements.insert(name.to_string(), value.into());
    }

    fn add_attributes(&mut self, table_alias: &str, attributes: &[&str]) {
        for attribute in build_select_attributes(table_alias, attributes) {
            self.add_attribute(attribute);
        }
    }

    pub fn include_channels(&mut self) {
        self.add_join(r#"INNER JOIN "videoChannel" AS "VideoChannel" ON "video"."channelId" = "VideoChannel"."id""#);
        self.add_join(r#"INNER JOIN "actor" AS "VideoChannel->Actor" ON "VideoChannel"."actorId" = "VideoChannel->Actor"."id""#);
        self.add_join(concat!(
            r#"LEFT OUTER JOIN "server" AS "VideoChannel->Actor->Server" "#,
            r#"ON "VideoChannel->Actor"."serverId" = "VideoChannel->Actor->Server"."id""#
        ));
        self.add_join(format!(
            concat!(
                r#"LEFT OUTER JOIN "actorImage" AS "VideoChannel->Actor->Avatars" "#,
                r#"ON "VideoChannel->Actor"."id" = "VideoChannel->Actor->Avatars"."actorId" "#,
                r#"AND "VideoChannel->Actor->Avatars"."type" = {}"#
            ),
            actor_image_type::AVATAR
        ));

        let t = self.tables;
        self.add_attributes("VideoChannel", t.channel());
        self.add_attributes("VideoChannel->Actor", t.actor());
        self.add_attributes("VideoChannel->Actor->Avatars", t.avatar());
        self.add_attributes("VideoChannel->Actor->Server", t.server());
    }

    pub fn include_accounts(&mut self) {
        self.add_join(r#"INNER JOIN "account" AS "VideoChannel->Account" ON "VideoChannel"."accountId" = "VideoChannel->Account"."id""#);
        self.add_join(concat!(
            r#"INNER JOIN "actor" AS "VideoChannel->Account->Actor" "#,
            r#"ON "VideoChannel->Account"."actorId" = "VideoChannel->Account->Actor"."id""#
        ));
        self.add_join(concat!(
            r#"LEFT OUTER JOIN "server" AS "VideoChannel->Account->Actor->Server" "#,
            r#"ON "VideoChannel->Account->Actor"."serverId" = "VideoChannel->Account->Actor->Server"."id""#
        ));
        self.add_join(format!(
            concat!(
                r#"LEFT OUTER JOIN "actorImage" AS "VideoChannel->Account->Actor->Avatars" "#,
                r#"ON "VideoChannel->Account"."actorId" = "VideoChannel->Account->Actor->Avatars"."actorId" "#,
                r#"AND "VideoChannel->Account->Actor->Avatars"."type" = {}"#
            ),
            actor_image_type::AVATAR
        ));

        let t = self.tables;
        self.add_attributes("VideoChannel->Account", t.account());
        self.add_attributes("VideoChannel->Account->Actor", t.actor());
        self.add_attributes("VideoChannel->Account->Actor->Avatars", t.avatar());
        self.add_attributes("VideoChannel->Account->Actor->Server", t.server());
    }

    pub fn include_thumbnails(&mut self) {
        self.add_join(r#"LEFT OUTER JOIN "thumbnail" AS "Thumbnails" ON "video"."id" = "Thumbnails"."videoId""#);

        let t = self.tables;
        self.add_attributes("Thumbnails", t.thumbnail());
    }

    /// Web video files. A `required` join drops videos without any.
    pub fn include_web_video_files(&mut self, required: bool) {
        self.add_join(format!(
            r#"{} "videoFile" AS "VideoFiles" ON "VideoFiles"."videoId" = "video"."id""#,
            join_keyword(required)
        ));

        let t = self.tables;
        self.add_attributes("VideoFiles", t.file());
    }

    /// Streaming playlists and their files.
    pub fn include_streaming_playlist_files(&mut self, required: bool) {
        let keyword = join_keyword(required);

        self.add_join(format!(
            concat!(
                r#"{} "videoStreamingPlaylist" AS "VideoStreamingPlaylists" "#,
                r#"ON "VideoStreamingPlaylists"."videoId" = "video"."id""#
            ),
            keyword
        ));
        self.add_join(format!(
            concat!(
                r#"{} "videoFile" AS "VideoStreamingPlaylists->VideoFiles" "#,
                r#"ON "VideoStreamingPlaylists->VideoFiles"."videoStreamingPlaylistId" = "VideoStreamingPlaylists"."id""#
            ),
            keyword
        ));

        let t = self.tables;
        self.add_attributes("VideoStreamingPlaylists", t.streaming_playlist());
        self.add_attributes("VideoStreamingPlaylists->VideoFiles", t.file());
    }

    pub fn include_user_history(&mut self, user_id: i32) {
        self.add_join(concat!(
            r#"LEFT OUTER JOIN "userVideoHistory" "#,
            r#"ON "video"."id" = "userVideoHistory"."videoId" AND "userVideoHistory"."userId" = :userVideoHistoryId"#
        ));
        self.replace("userVideoHistoryId", user_id);

        let t = self.tables;
        self.add_attributes("userVideoHistory", t.user_history());
    }

    pub fn include_tags(&mut self) {
        self.add_join(concat!(
            r#"LEFT OUTER JOIN ("videoTag" AS "Tags->VideoTagModel" "#,
            r#"INNER JOIN "tag" AS "Tags" ON "Tags"."id" = "Tags->VideoTagModel"."tagId") "#,
            r#"ON "video"."id" = "Tags->VideoTagModel"."videoId""#
        ));

        let t = self.tables;
        self.add_attributes("Tags", t.tag());
        self.add_attributes("Tags->VideoTagModel", t.video_tag());
    }

    pub fn include_trackers(&mut self) {
        self.add_join(concat!(
            r#"LEFT OUTER JOIN ("videoTracker" AS "Trackers->VideoTrackerModel" "#,
            r#"INNER JOIN "tracker" AS "Trackers" ON "Trackers"."id" = "Trackers->VideoTrackerModel"."trackerId") "#,
            r#"ON "video"."id" = "Trackers->VideoTrackerModel"."videoId""#
        ));

        let t = self.tables;
        self.add_attributes("Trackers", t.tracker());
        self.add_attributes("Trackers->VideoTrackerModel", t.video_tracker());
    }

    pub fn include_blacklisted(&mut self) {
        self.add_join(r#"LEFT OUTER JOIN "videoBlacklist" AS "VideoBlacklist" ON "video"."id" = "VideoBlacklist"."videoId""#);

        let t = self.tables;
        self.add_attributes("VideoBlacklist", t.blacklisted());
    }

    /// Blocklist entries of the server account (and the viewer) targeting the owner.
    pub fn include_blocked_owner_and_server(
        &mut self,
        server_account_id: i32,
        user_account_id: Option<i32>,
    ) {
        let mut blocker_ids = vec![server_account_id];
        blocker_ids.extend(user_account_id);

        let in_clause = create_safe_in(&blocker_ids, &[]);

        self.add_join(format!(
            concat!(
                r#"LEFT JOIN "accountBlocklist" AS "VideoChannel->Account->AccountBlocklist" "#,
                r#"ON "VideoChannel->Account"."id" = "VideoChannel->Account->AccountBlocklist"."targetAccountId" "#,
                r#"AND "VideoChannel->Account->AccountBlocklist"."accountId" IN ({ids})"#
            ),
            ids = in_clause
        ));
        self.add_join(format!(
            concat!(
                r#"LEFT JOIN "serverBlocklist" AS "VideoChannel->Account->Actor->Server->ServerBlocklist" "#,
                r#"ON "VideoChannel->Account->Actor->Server->ServerBlocklist"."targetServerId" = "VideoChannel->Account->Actor"."serverId" "#,
                r#"AND "VideoChannel->Account->Actor->Server->ServerBlocklist"."accountId" IN ({ids})"#
            ),
            ids = in_clause
        ));

        let t = self.tables;
        self.add_attributes("VideoChannel->Account->AccountBlocklist", t.blocklist());
        self.add_attributes(
            "VideoChannel->Account->Actor->Server->ServerBlocklist",
            t.blocklist(),
        );
    }

    pub fn include_schedule_update(&mut self) {
        self.add_join(concat!(
            r#"LEFT OUTER JOIN "scheduleVideoUpdate" AS "ScheduleVideoUpdate" "#,
            r#"ON "video"."id" = "ScheduleVideoUpdate"."videoId""#
        ));

        let t = self.tables;
        self.add_attributes("ScheduleVideoUpdate", t.schedule_update());
    }

    pub fn include_live(&mut self) {
        self.add_join(r#"LEFT OUTER JOIN "videoLive" AS "VideoLive" ON "video"."id" = "VideoLive"."videoId""#);

        let t = self.tables;
        self.add_attributes("VideoLive", t.live());
    }

    pub fn include_video_source(&mut self) {
        self.add_join(r#"LEFT OUTER JOIN "videoSource" AS "VideoSource" ON "video"."id" = "VideoSource"."videoId""#);

        let t = self.tables;
        self.add_attributes("VideoSource", t.video_source());
    }

    pub fn include_automatic_tags(&mut self, auto_tag_of_account_id: i32) {
        self.add_join(concat!(
            r#"LEFT JOIN ("videoAutomaticTag" AS "VideoAutomaticTags" "#,
            r#"INNER JOIN "automaticTag" AS "VideoAutomaticTags->AutomaticTag" "#,
            r#"ON "VideoAutomaticTags->AutomaticTag"."id" = "VideoAutomaticTags"."automaticTagId") "#,
            r#"ON "video"."id" = "VideoAutomaticTags"."videoId" "#,
            r#"AND "VideoAutomaticTags"."accountId" = :autoTagOfAccountId"#
        ));
        self.replace("autoTagOfAccountId", auto_tag_of_account_id);

        let t = self.tables;
        self.add_attributes("VideoAutomaticTags", t.video_automatic_tag());
        self.add_attributes("VideoAutomaticTags->AutomaticTag", t.automatic_tag());
    }

    pub fn include_web_video_redundancies(&mut self) {
        self.add_join(concat!(
            r#"LEFT OUTER JOIN "videoRedundancy" AS "VideoFiles->RedundancyVideos" "#,
            r#"ON "VideoFiles"."id" = "VideoFiles->RedundancyVideos"."videoFileId""#
        ));

        let t = self.tables;
        self.add_attributes("VideoFiles->RedundancyVideos", t.redundancy());
    }

    pub fn include_streaming_playlist_redundancies(&mut self) {
        self.add_join(concat!(
            r#"LEFT OUTER JOIN "videoRedundancy" AS "VideoStreamingPlaylists->RedundancyVideos" "#,
            r#"ON "VideoStreamingPlaylists"."id" = "VideoStreamingPlaylists->RedundancyVideos"."videoStreamingPlaylistId""#
        ));

        let t = self.tables;
        self.add_attributes("VideoStreamingPlaylists->RedundancyVideos", t.redundancy());
    }

    /// Restrict the query to the looked-up videos.
    pub fn where_lookup(&mut self, lookup: &VideoLookup) {
        self.where_clause = match lookup {
            VideoLookup::Ids(ids) => {
                format!(r#"WHERE "video"."id" IN ({})"#, create_safe_in(ids, &[]))
            }
            VideoLookup::Url(url) => {
                self.replace("videoUrl", url.clone());
                r#"WHERE "video"."url" = :videoUrl"#.to_string()
            }
            VideoLookup::Id(id) => {
                self.replace("videoId", *id);
                r#"WHERE "video"."id" = :videoId"#.to_string()
            }
            VideoLookup::Uuid(uuid) => {
                self.replace("videoId", *uuid);
                r#"WHERE "video"."uuid" = :videoId"#.to_string()
            }
        };
    }

    /// `SELECT ... FROM "video" <joins> <where> <suffix>`.
    #[must_use]
    pub fn into_query(self, suffix: &str) -> BuiltQuery {
        let mut parts = vec![
            format!("SELECT {}", self.attributes.join(", ")),
            r#"FROM "video""#.to_string(),
        ];

        parts.extend(self.joins);

        if !self.where_clause.is_empty() {
            parts.push(self.where_clause);
        }

        if !suffix.is_empty() {
            parts.push(suffix.to_string());
        }

        BuiltQuery::new(parts.join(" "), self.replacements)
    }
}

const fn join_keyword(required: bool) -> &'static str {
    if required { "INNER JOIN" } else { "LEFT JOIN" }
}
