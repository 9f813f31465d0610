//! Comment list and count queries.
//!
//! The list query filters, sorts and pages comments in an inner subquery,
//! then joins author avatars on the page only and re-applies the order.
//! Every build starts from an empty [`QueryState`], so the generated SQL and
//! replacements depend on the options alone.

use peertube_common::{AppError, AppResult};
use sea_orm::{ConnectionTrait, Value};

use super::model_builder::VideoCommentModelBuilder;
use super::table_attributes::VideoCommentTableAttributes;
use crate::models::{VideoComment, actor_image_type, video_privacy};
use crate::query::joins::JoinRegistry;
use crate::query::run_query::{
    BuiltQuery, Replacements, create_safe_in, escape_like, parse_row_count, run_query,
};
use crate::query::sort::Sort;

/// Output columns a comment list may be sorted on.
pub const SORTABLE_COLUMNS: &[&str] = &["createdAt", "totalReplies"];

/// Accepted state of a channel collaborator.
const COLLABORATOR_STATE_ACCEPTED: i32 = 2;

/// Which parts of the comment graph a listing projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSelectType {
    /// Comments across videos: author, video and avatars.
    #[default]
    ApiList,
    /// Comments of one video: author and avatars, no video.
    ApiVideo,
    /// Syndication feeds: author, video and avatars.
    Feed,
    /// Bare comment columns.
    CommentOnly,
}

impl CommentSelectType {
    const fn includes_account(self) -> bool {
        matches!(self, Self::ApiList | Self::ApiVideo | Self::Feed)
    }

    const fn includes_video(self) -> bool {
        matches!(self, Self::ApiList | Self::Feed)
    }

    const fn includes_automatic_tags(self) -> bool {
        matches!(self, Self::ApiList | Self::ApiVideo)
    }
}

/// Filters, pagination and projection of a comment listing.
///
/// Every filter is optional and filters are AND-combined.
#[derive(Debug, Clone, Default)]
pub struct ListVideoCommentsOptions {
    pub select_type: CommentSelectType,

    /// Account whose automatic tags are joined and filtered on.
    pub auto_tag_of_account_id: Option<i32>,

    pub start: Option<u64>,
    pub count: Option<u64>,
    pub sort: Option<String>,

    pub video_id: Option<i32>,
    /// Root comment of a thread: matches the root and every comment under it.
    pub thread_id: Option<i32>,
    pub account_id: Option<i32>,

    /// Accounts whose account and server blocklists hide comments.
    pub blocker_account_ids: Option<Vec<i32>>,

    /// Only thread roots.
    pub is_thread: bool,
    /// Hide soft deleted comments. Also applies to the reply counters.
    pub not_deleted: bool,

    /// `Some(true)`: local authors only, `Some(false)`: remote authors only.
    pub is_local: Option<bool>,
    /// `Some(true)`: comments on local videos only, `Some(false)`: remote videos only.
    pub on_local_video: Option<bool>,
    pub on_public_video: bool,

    pub video_channel_owner_id: Option<i32>,
    pub video_account_owner_id: Option<i32>,
    /// Widen `video_account_owner_id` to channels the account collaborates on.
    pub include_collaborations: bool,

    pub held_for_review: Option<bool>,
    /// Author whose held comments stay visible when `held_for_review` is `Some(false)`.
    pub held_for_review_account_id_exception: Option<i32>,

    /// Automatic tag names, matched case-insensitively.
    pub auto_tag_one_of: Option<Vec<String>>,

    pub search: Option<String>,
    pub search_account: Option<String>,
    pub search_video: Option<String>,

    pub include_reply_counters: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CommentJoin {
    Account,
    Video,
    VideoChannel,
    Collaborators,
    AutomaticTags,
    Avatars,
}

/// Everything a single build accumulates.
#[derive(Debug, Default)]
struct QueryState {
    replacements: Replacements,
    joins: JoinRegistry<CommentJoin>,
    lateral_joins: Vec<String>,
    outer_joins: JoinRegistry<CommentJoin>,
}

impl QueryState {
    fn replace(&mut self, name: &str, value: impl Into<Value>) {
        self.replacements.insert(name.to_string(), value.into());
    }

    fn join_account(&mut self) {
        self.joins.ensure_join(CommentJoin::Account, || {
            concat!(
                r#"LEFT JOIN "account" "Account" ON "Account"."id" = "VideoCommentModel"."accountId" "#,
                r#"LEFT JOIN "actor" "Account->Actor" ON "Account->Actor"."id" = "Account"."actorId" "#,
                r#"LEFT JOIN "server" "Account->Actor->Server" "#,
                r#"ON "Account->Actor"."serverId" = "Account->Actor->Server"."id""#
            )
            .to_string()
        });
    }

    fn join_video(&mut self) {
        self.joins.ensure_join(CommentJoin::Video, || {
            r#"LEFT JOIN "video" "Video" ON "Video"."id" = "VideoCommentModel"."videoId""#
                .to_string()
        });
    }

    fn join_video_channel(&mut self) {
        self.join_video();

        self.joins.ensure_join(CommentJoin::VideoChannel, || {
            r#"LEFT JOIN "videoChannel" "Video->VideoChannel" ON "Video"."channelId" = "Video->VideoChannel"."id""#
                .to_string()
        });
    }

    fn join_collaborators(&mut self) {
        self.join_video_channel();

        self.joins.ensure_join(CommentJoin::Collaborators, || {
            format!(
                concat!(
                    r#"LEFT JOIN "videoChannelCollaborator" "Video->VideoChannel->Collaborators" "#,
                    r#"ON "Video->VideoChannel->Collaborators"."channelId" = "Video->VideoChannel"."id" "#,
                    r#"AND "Video->VideoChannel->Collaborators"."accountId" = :videoAccountOwnerId "#,
                    r#"AND "Video->VideoChannel->Collaborators"."state" = {}"#
                ),
                COLLABORATOR_STATE_ACCEPTED
            )
        });
    }

    fn join_automatic_tags(&mut self, auto_tag_of_account_id: i32) {
        let added = self.joins.ensure_join(CommentJoin::AutomaticTags, || {
            concat!(
                r#"LEFT JOIN ("commentAutomaticTag" AS "CommentAutomaticTags" "#,
                r#"INNER JOIN "automaticTag" AS "CommentAutomaticTags->AutomaticTag" "#,
                r#"ON "CommentAutomaticTags->AutomaticTag"."id" = "CommentAutomaticTags"."automaticTagId") "#,
                r#"ON "VideoCommentModel"."id" = "CommentAutomaticTags"."commentId" "#,
                r#"AND "CommentAutomaticTags"."accountId" = :autoTagOfAccountId"#
            )
            .to_string()
        });

        if added {
            self.replace("autoTagOfAccountId", auto_tag_of_account_id);
        }
    }

    fn join_avatars(&mut self) {
        self.outer_joins.ensure_join(CommentJoin::Avatars, || {
            format!(
                concat!(
                    r#"LEFT JOIN "actorImage" "Account->Actor->Avatars" "#,
                    r#"ON "VideoCommentModel"."Account.Actor.id" = "Account->Actor->Avatars"."actorId" "#,
                    r#"AND "Account->Actor->Avatars"."type" = {}"#
                ),
                actor_image_type::AVATAR
            )
        });
    }
}

/// Builds and runs comment list and count queries.
#[derive(Debug, Clone)]
pub struct VideoCommentListQueryBuilder {
    options: ListVideoCommentsOptions,
    sort: Option<Sort>,
    tables: VideoCommentTableAttributes,
}

impl VideoCommentListQueryBuilder {
    /// Validate the options.
    ///
    /// Reply counters need `video_id`, automatic tag filters need
    /// `auto_tag_of_account_id`: both are caller errors.
    pub fn new(options: ListVideoCommentsOptions) -> AppResult<Self> {
        if options.include_reply_counters && options.video_id.is_none() {
            return Err(AppError::Internal(
                "Cannot include reply counters without videoId".to_string(),
            ));
        }

        if options.auto_tag_one_of.is_some() && options.auto_tag_of_account_id.is_none() {
            return Err(AppError::Internal(
                "Cannot filter on automatic tags without autoTagOfAccountId".to_string(),
            ));
        }

        let sort = options
            .sort
            .as_deref()
            .map(|value| Sort::parse(value, SORTABLE_COLUMNS))
            .transpose()?;

        if sort.as_ref().is_some_and(|s| s.field == "totalReplies") && !options.include_reply_counters
        {
            return Err(AppError::BadRequest(
                "Cannot sort on totalReplies without reply counters".to_string(),
            ));
        }

        Ok(Self {
            options,
            sort,
            tables: VideoCommentTableAttributes,
        })
    }

    /// List the comments matching the options.
    pub async fn list_comments<C: ConnectionTrait>(&self, db: &C) -> AppResult<Vec<VideoComment>> {
        let rows = run_query(db, &self.build_list_query()).await?;

        Ok(VideoCommentModelBuilder::new().build_comments_from_rows(&rows))
    }

    /// Count the comments matching the options, ignoring pagination.
    pub async fn count_comments<C: ConnectionTrait>(&self, db: &C) -> AppResult<u64> {
        let rows = run_query(db, &self.build_count_query()).await?;

        Ok(parse_row_count(&rows))
    }

    /// Paginated list query.
    #[must_use]
    pub fn build_list_query(&self) -> BuiltQuery {
        let mut state = QueryState::default();

        let inner = self.build_inner_list_query(&mut state);
        let select = self.build_list_select(&mut state);
        let outer_joins = state.outer_joins.sql();

        let sql = join_sql(&[
            &select,
            &format!(r#"FROM ({inner}) AS "VideoCommentModel""#),
            &outer_joins,
            &self.order(),
        ]);

        BuiltQuery::new(sql, state.replacements)
    }

    /// Count query over the same filters.
    #[must_use]
    pub fn build_count_query(&self) -> BuiltQuery {
        let mut state = QueryState::default();

        let where_clause = self.build_where(&mut state);
        let joins = state.joins.sql();

        let sql = join_sql(&[
            r#"SELECT COUNT(DISTINCT "VideoCommentModel"."id") AS "total""#,
            r#"FROM "videoComment" AS "VideoCommentModel""#,
            &joins,
            &where_clause,
        ]);

        BuiltQuery::new(sql, state.replacements)
    }

    fn build_inner_list_query(&self, state: &mut QueryState) -> String {
        let where_clause = self.build_where(state);
        let select = self.build_inner_list_select(state);
        let limit = self.inner_limit(state);

        join_sql(&[
            &select,
            r#"FROM "videoComment" AS "VideoCommentModel""#,
            &state.joins.sql(),
            &state.lateral_joins.join(" "),
            &where_clause,
            &self.order(),
            &limit,
        ])
    }

    fn build_where(&self, state: &mut QueryState) -> String {
        let o = &self.options;
        let mut conditions: Vec<String> = Vec::new();

        if let Some(video_id) = o.video_id {
            state.replace("videoId", video_id);
            conditions.push(r#""VideoCommentModel"."videoId" = :videoId"#.to_string());
        }

        if let Some(thread_id) = o.thread_id {
            state.replace("threadId", thread_id);
            conditions.push(
                r#"("VideoCommentModel"."id" = :threadId OR "VideoCommentModel"."originCommentId" = :threadId)"#
                    .to_string(),
            );
        }

        if let Some(account_id) = o.account_id {
            state.replace("accountId", account_id);
            conditions.push(r#""VideoCommentModel"."accountId" = :accountId"#.to_string());
        }

        if o.blocker_account_ids.is_some() {
            state.join_video_channel();
            conditions.extend(self.block_where("VideoCommentModel", "Video->VideoChannel"));
        }

        if o.is_thread {
            conditions.push(r#""VideoCommentModel"."inReplyToCommentId" IS NULL"#.to_string());
        }

        if o.not_deleted {
            conditions.push(r#""VideoCommentModel"."deletedAt" IS NULL"#.to_string());
        }

        match o.held_for_review {
            Some(true) => {
                conditions.push(r#""VideoCommentModel"."heldForReview" IS TRUE"#.to_string());
            }
            Some(false) => {
                let base = r#""VideoCommentModel"."heldForReview" IS FALSE"#;

                if let Some(exception) = o.held_for_review_account_id_exception {
                    state.replace("heldForReviewAccountIdException", exception);
                    conditions.push(format!(
                        r#"({base} OR "VideoCommentModel"."accountId" = :heldForReviewAccountIdException)"#
                    ));
                } else {
                    conditions.push(base.to_string());
                }
            }
            None => {}
        }

        if let (Some(tags), Some(account_id)) = (&o.auto_tag_one_of, o.auto_tag_of_account_id) {
            state.join_automatic_tags(account_id);

            let mut names = Vec::with_capacity(tags.len());
            for (i, tag) in tags.iter().enumerate() {
                let name = format!("autoTag{i}");
                state.replace(&name, tag.to_lowercase());
                names.push(format!(":{name}"));
            }

            let list = if names.is_empty() {
                "NULL".to_string()
            } else {
                names.join(", ")
            };

            conditions.push(format!(
                r#"lower("CommentAutomaticTags->AutomaticTag"."name") IN ({list})"#
            ));
        }

        match o.is_local {
            Some(true) => {
                state.join_account();
                conditions.push(r#""Account->Actor"."serverId" IS NULL"#.to_string());
            }
            Some(false) => {
                state.join_account();
                conditions.push(r#""Account->Actor"."serverId" IS NOT NULL"#.to_string());
            }
            None => {}
        }

        match o.on_local_video {
            Some(true) => {
                state.join_video();
                conditions.push(r#""Video"."remote" IS FALSE"#.to_string());
            }
            Some(false) => {
                state.join_video();
                conditions.push(r#""Video"."remote" IS TRUE"#.to_string());
            }
            None => {}
        }

        if o.on_public_video {
            state.join_video();
            conditions.push(format!(r#""Video"."privacy" = {}"#, video_privacy::PUBLIC));
        }

        if let Some(owner_id) = o.video_account_owner_id {
            state.join_video_channel();
            state.replace("videoAccountOwnerId", owner_id);

            if o.include_collaborations {
                state.join_collaborators();
                conditions.push(
                    concat!(
                        r#"("Video->VideoChannel"."accountId" = :videoAccountOwnerId "#,
                        r#"OR "Video->VideoChannel->Collaborators"."id" IS NOT NULL)"#
                    )
                    .to_string(),
                );
            } else {
                conditions.push(r#""Video->VideoChannel"."accountId" = :videoAccountOwnerId"#.to_string());
            }
        }

        if let Some(channel_id) = o.video_channel_owner_id {
            state.join_video_channel();
            state.replace("videoChannelOwnerId", channel_id);
            conditions.push(r#""Video->VideoChannel"."id" = :videoChannelOwnerId"#.to_string());
        }

        if let Some(search) = &o.search {
            state.join_video();
            state.join_account();
            state.replace("search", like_pattern(search));

            conditions.push(
                concat!(
                    r#"("VideoCommentModel"."text" ILIKE :search "#,
                    r#"OR "Account->Actor"."preferredUsername" ILIKE :search "#,
                    r#"OR "Account"."name" ILIKE :search "#,
                    r#"OR "Video"."name" ILIKE :search)"#
                )
                .to_string(),
            );
        }

        if let Some(search) = &o.search_account {
            state.join_account();
            state.replace("searchAccount", like_pattern(search));

            conditions.push(
                concat!(
                    r#"("Account->Actor"."preferredUsername" ILIKE :searchAccount "#,
                    r#"OR "Account"."name" ILIKE :searchAccount)"#
                )
                .to_string(),
            );
        }

        if let Some(search) = &o.search_video {
            state.join_video();
            state.replace("searchVideo", like_pattern(search));

            conditions.push(r#""Video"."name" ILIKE :searchVideo"#.to_string());
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    fn build_inner_list_select(&self, state: &mut QueryState) -> String {
        let t = &self.tables;
        let o = &self.options;

        let mut to_select = vec![t.video_comment_attributes()];

        if o.select_type.includes_account() {
            state.join_account();

            if o.select_type.includes_video() {
                state.join_video();
                to_select.push(t.video_attributes());
            }

            to_select.push(t.account_attributes());
            to_select.push(t.actor_attributes());
            to_select.push(t.server_attributes());
        }

        if let Some(account_id) = o
            .auto_tag_of_account_id
            .filter(|_| o.select_type.includes_automatic_tags())
        {
            state.join_automatic_tags(account_id);

            to_select.push(t.comment_automatic_tag_attributes());
            to_select.push(t.automatic_tag_attributes());
        }

        if o.include_reply_counters {
            // Bound again for the lateral joins, which filter on it to help the planner.
            if let Some(video_id) = o.video_id {
                state.replace("videoId", video_id);
            }

            state
                .lateral_joins
                .push(self.reply_counter_lateral("totalReplies", false));
            state
                .lateral_joins
                .push(self.reply_counter_lateral("totalRepliesFromVideoAuthor", true));

            to_select.push(
                r#""totalRepliesFromVideoAuthor"."count" AS "totalRepliesFromVideoAuthor""#
                    .to_string(),
            );
            to_select.push(r#""totalReplies"."count" AS "totalReplies""#.to_string());
        }

        format!("SELECT {}", to_select.join(", "))
    }

    fn build_list_select(&self, state: &mut QueryState) -> String {
        let mut to_select = vec![r#""VideoCommentModel".*"#.to_string()];

        if self.options.select_type.includes_account() {
            state.join_avatars();
            to_select.push(self.tables.avatar_attributes());
        }

        format!("SELECT {}", to_select.join(", "))
    }

    /// Account and server blocklist exclusion for comments of `comment_table`.
    ///
    /// The owner account of the video channel always counts as a blocker.
    fn block_where(&self, comment_table: &str, channel_table: &str) -> Vec<String> {
        let blocker_ids = self.options.blocker_account_ids.as_deref().unwrap_or_default();
        let channel_account = format!(r#""{channel_table}"."accountId""#);
        let ids = create_safe_in(blocker_ids, &[&channel_account]);

        vec![
            format!(
                concat!(
                    r#"NOT EXISTS (SELECT 1 FROM "accountBlocklist" "#,
                    r#"WHERE "targetAccountId" = "{comment}"."accountId" "#,
                    r#"AND "accountId" IN ({ids}))"#
                ),
                comment = comment_table,
                ids = ids
            ),
            format!(
                concat!(
                    r#"NOT EXISTS (SELECT 1 FROM "account" "#,
                    r#"INNER JOIN "actor" ON "account"."actorId" = "actor"."id" "#,
                    r#"INNER JOIN "serverBlocklist" ON "actor"."serverId" = "serverBlocklist"."targetServerId" "#,
                    r#"WHERE "account"."id" = "{comment}"."accountId" "#,
                    r#"AND "serverBlocklist"."accountId" IN ({ids}))"#
                ),
                comment = comment_table,
                ids = ids
            ),
        ]
    }

    /// Lateral reply counter of one comment.
    ///
    /// Both counters share the blocklist and deletion fragments, the deletion
    /// one following `not_deleted` like the listing itself.
    fn reply_counter_lateral(&self, alias: &str, from_video_author: bool) -> String {
        let channel_join = if from_video_author {
            "INNER JOIN"
        } else {
            "LEFT JOIN"
        };

        let mut conditions = vec![
            r#"("replies"."inReplyToCommentId" = "VideoCommentModel"."id" OR "replies"."originCommentId" = "VideoCommentModel"."id")"#
                .to_string(),
        ];

        if from_video_author {
            conditions.push(r#""replies"."accountId" = "videoChannel"."accountId""#.to_string());
        }

        if self.options.not_deleted {
            conditions.push(r#""replies"."deletedAt" IS NULL"#.to_string());
        }

        conditions.extend(self.block_where("replies", "videoChannel"));

        format!(
            concat!(
                r#"LEFT JOIN LATERAL (SELECT COUNT("replies"."id") AS "count" "#,
                r#"FROM "videoComment" AS "replies" "#,
                r#"INNER JOIN "video" ON "video"."id" = "replies"."videoId" AND "replies"."videoId" = :videoId "#,
                r#"{channel_join} "videoChannel" ON "videoChannel"."id" = "video"."channelId" "#,
                r#"WHERE {conditions}) "{alias}" ON TRUE"#
            ),
            channel_join = channel_join,
            conditions = conditions.join(" AND "),
            alias = alias
        )
    }

    fn order(&self) -> String {
        self.sort.as_ref().map(Sort::order_by).unwrap_or_default()
    }

    fn inner_limit(&self, state: &mut QueryState) -> String {
        let Some(count) = self.options.count else {
            return String::new();
        };

        state.replace("limit", i64::try_from(count).unwrap_or(i64::MAX));
        state.replace(
            "offset",
            i64::try_from(self.options.start.unwrap_or(0)).unwrap_or(i64::MAX),
        );

        "LIMIT :limit OFFSET :offset".to_string()
    }
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

fn join_sql(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn builder(options: ListVideoCommentsOptions) -> VideoCommentListQueryBuilder {
        VideoCommentListQueryBuilder::new(options).unwrap()
    }

    #[test]
    fn test_reply_counters_require_video_id() {
        let err = VideoCommentListQueryBuilder::new(ListVideoCommentsOptions {
            include_reply_counters: true,
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_auto_tag_filter_requires_account() {
        let err = VideoCommentListQueryBuilder::new(ListVideoCommentsOptions {
            auto_tag_one_of: Some(vec!["spam".to_string()]),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_unknown_sort_is_rejected() {
        let err = VideoCommentListQueryBuilder::new(ListVideoCommentsOptions {
            sort: Some("-text".to_string()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_total_replies_sort_requires_counters() {
        let err = VideoCommentListQueryBuilder::new(ListVideoCommentsOptions {
            sort: Some("-totalReplies".to_string()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_shared_join_is_emitted_once() {
        let query = builder(ListVideoCommentsOptions {
            select_type: CommentSelectType::CommentOnly,
            is_local: Some(true),
            search_account: Some("x".to_string()),
            ..Default::default()
        })
        .build_list_query();

        assert_eq!(query.sql.matches(r#"LEFT JOIN "account" "Account""#).count(), 1);
        assert_eq!(query.sql.matches(r#"LEFT JOIN "actor" "Account->Actor""#).count(), 1);
    }

    #[test]
    fn test_api_list_joins_video_once_with_video_filters() {
        let query = builder(ListVideoCommentsOptions {
            on_local_video: Some(true),
            on_public_video: true,
            search_video: Some("cats".to_string()),
            ..Default::default()
        })
        .build_list_query();

        assert_eq!(query.sql.matches(r#"LEFT JOIN "video" "Video""#).count(), 1);
        assert!(query.sql.contains(r#""Video"."remote" IS FALSE"#));
        assert!(query.sql.contains(r#""Video"."privacy" = 1"#));
    }

    #[test]
    fn test_search_terms_are_bound() {
        let query = builder(ListVideoCommentsOptions {
            search: Some("50%' OR 1=1 --".to_string()),
            ..Default::default()
        })
        .build_list_query();

        assert!(!query.sql.contains("OR 1=1"));
        assert_eq!(
            query.replacements.get("search"),
            Some(&Value::from(r"%50\%' OR 1=1 --%".to_string()))
        );
        assert!(query.to_statement().is_ok());
    }

    #[test]
    fn test_reply_counters_share_block_fragment() {
        let b = builder(ListVideoCommentsOptions {
            video_id: Some(1),
            blocker_account_ids: Some(vec![4, 5]),
            include_reply_counters: true,
            ..Default::default()
        });
        let query = b.build_list_query();
        let fragment = b.block_where("replies", "videoChannel").join(" AND ");

        assert!(fragment.contains(r#"IN (4, 5, "videoChannel"."accountId")"#));
        assert_eq!(query.sql.matches(&fragment).count(), 2);
        assert!(query.sql.contains(r#") "totalReplies" ON TRUE"#));
        assert!(query.sql.contains(r#") "totalRepliesFromVideoAuthor" ON TRUE"#));
        assert!(query.to_statement().is_ok());
    }

    #[test]
    fn test_reply_counters_follow_deletion_filter() {
        let counted_all = builder(ListVideoCommentsOptions {
            video_id: Some(1),
            include_reply_counters: true,
            ..Default::default()
        })
        .build_list_query();

        let not_deleted = builder(ListVideoCommentsOptions {
            video_id: Some(1),
            include_reply_counters: true,
            not_deleted: true,
            ..Default::default()
        })
        .build_list_query();

        assert!(!counted_all.sql.contains(r#""replies"."deletedAt" IS NULL"#));
        assert_eq!(
            not_deleted
                .sql
                .matches(r#""replies"."deletedAt" IS NULL"#)
                .count(),
            2
        );
        assert!(not_deleted.sql.contains(r#""VideoCommentModel"."deletedAt" IS NULL"#));
    }

    #[test]
    fn test_paging_happens_in_inner_query() {
        let query = builder(ListVideoCommentsOptions {
            start: Some(20),
            count: Some(10),
            sort: Some("-createdAt".to_string()),
            ..Default::default()
        })
        .build_list_query();

        assert!(query.sql.contains(
            r#"ORDER BY "createdAt" DESC, "id" ASC LIMIT :limit OFFSET :offset) AS "VideoCommentModel""#
        ));
        assert!(query.sql.ends_with(r#"ORDER BY "createdAt" DESC, "id" ASC"#));
        assert!(query.sql.contains(r#"LEFT JOIN "actorImage" "Account->Actor->Avatars""#));
        assert_eq!(query.replacements.get("offset"), Some(&Value::from(20i64)));
    }

    #[test]
    fn test_comment_only_has_no_avatar_join() {
        let query = builder(ListVideoCommentsOptions {
            select_type: CommentSelectType::CommentOnly,
            ..Default::default()
        })
        .build_list_query();

        assert!(!query.sql.contains("actorImage"));
        assert!(!query.sql.contains(r#""Account""#));
    }

    #[test]
    fn test_api_video_selects_no_video_columns() {
        let query = builder(ListVideoCommentsOptions {
            select_type: CommentSelectType::ApiVideo,
            video_id: Some(3),
            ..Default::default()
        })
        .build_list_query();

        assert!(!query.sql.contains(r#"AS "Video.uuid""#));
        assert!(query.sql.contains(r#"AS "Account.Actor.preferredUsername""#));
    }

    #[test]
    fn test_auto_tags_are_lowercased_and_bound() {
        let query = builder(ListVideoCommentsOptions {
            auto_tag_of_account_id: Some(9),
            auto_tag_one_of: Some(vec!["Spam".to_string(), "LINKS".to_string()]),
            ..Default::default()
        })
        .build_list_query();

        assert!(query.sql.contains(
            r#"lower("CommentAutomaticTags->AutomaticTag"."name") IN (:autoTag0, :autoTag1)"#
        ));
        assert_eq!(
            query.replacements.get("autoTag1"),
            Some(&Value::from("links".to_string()))
        );
        assert_eq!(query.sql.matches(r#""commentAutomaticTag""#).count(), 1);
        assert!(query.to_statement().is_ok());
    }

    #[test]
    fn test_include_collaborations() {
        let query = builder(ListVideoCommentsOptions {
            video_account_owner_id: Some(7),
            include_collaborations: true,
            ..Default::default()
        })
        .build_count_query();

        assert!(query.sql.contains(r#""Video->VideoChannel->Collaborators"."state" = 2"#));
        assert!(query.sql.contains(
            r#"OR "Video->VideoChannel->Collaborators"."id" IS NOT NULL)"#
        ));
        assert!(query.to_statement().is_ok());
    }

    #[test]
    fn test_held_for_review_exception() {
        let query = builder(ListVideoCommentsOptions {
            held_for_review: Some(false),
            held_for_review_account_id_exception: Some(12),
            ..Default::default()
        })
        .build_count_query();

        assert!(query.sql.contains(
            r#"("VideoCommentModel"."heldForReview" IS FALSE OR "VideoCommentModel"."accountId" = :heldForReviewAccountIdException)"#
        ));
    }

    #[test]
    fn test_count_query_has_no_paging() {
        let query = builder(ListVideoCommentsOptions {
            video_id: Some(1),
            count: Some(10),
            sort: Some("createdAt".to_string()),
            ..Default::default()
        })
        .build_count_query();

        assert_eq!(
            query.sql,
            r#"SELECT COUNT(DISTINCT "VideoCommentModel"."id") AS "total" FROM "videoComment" AS "VideoCommentModel" WHERE "VideoCommentModel"."videoId" = :videoId"#
        );
    }

    #[test]
    fn test_builds_are_reproducible() {
        let b = builder(ListVideoCommentsOptions {
            video_id: Some(1),
            thread_id: Some(2),
            blocker_account_ids: Some(vec![3]),
            search: Some("hello".to_string()),
            include_reply_counters: true,
            count: Some(5),
            ..Default::default()
        });

        assert_eq!(b.build_list_query(), b.build_list_query());
        assert_eq!(b.build_count_query(), b.build_count_query());
    }
}
