//! Query loading a page of videos whose ids were already selected and sorted.

use peertube_common::{AppError, AppResult};

use super::query_parts::{VideoLookup, VideoQueryParts};
use super::table_attributes::BuildMode;
use crate::models::VideoInclude;
use crate::query::run_query::BuiltQuery;

/// Options of a video page load.
#[derive(Debug, Clone, Default)]
pub struct ListVideosOptions {
    /// Ids of the page, in display order.
    pub ids: Vec<i32>,
    pub include: VideoInclude,
    /// Attach the watch history of this user.
    pub user_id: Option<i32>,
    /// Account of the viewer, added to the blockers of `BLOCKED_OWNER`.
    pub user_account_id: Option<i32>,
    /// Account of the instance, required by `BLOCKED_OWNER`.
    pub server_account_id: Option<i32>,
    /// Required by `AUTOMATIC_TAGS`.
    pub auto_tag_of_account_id: Option<i32>,
}

/// Builds the row query of a video page, keeping the order of `ids`.
#[derive(Debug, Clone)]
pub struct VideoListQueryBuilder {
    options: ListVideosOptions,
}

impl VideoListQueryBuilder {
    /// Fails when an include flag misses the account it is scoped to.
    pub fn new(options: ListVideosOptions) -> AppResult<Self> {
        if options.include.contains(VideoInclude::BLOCKED_OWNER)
            && options.server_account_id.is_none()
        {
            return Err(AppError::Internal(
                "Cannot include blocked owners without the server account".to_string(),
            ));
        }

        if options.include.contains(VideoInclude::AUTOMATIC_TAGS)
            && options.auto_tag_of_account_id.is_none()
        {
            return Err(AppError::Internal(
                "Cannot include automatic tags without the account they are scoped to".to_string(),
            ));
        }

        Ok(Self { options })
    }

    #[must_use]
    pub fn options(&self) -> &ListVideosOptions {
        &self.options
    }

    #[must_use]
    pub fn build_query(&self) -> BuiltQuery {
        let o = &self.options;
        let mut parts = VideoQueryParts::new(BuildMode::List);

        parts.include_video_attributes();
        parts.include_channels();
        parts.include_accounts();
        parts.include_thumbnails();

        if let Some(user_id) = o.user_id {
            parts.include_user_history(user_id);
        }

        if o.include.contains(VideoInclude::FILES) {
            parts.include_web_video_files(false);
            parts.include_streaming_playlist_files(false);
        }

        if o.include.contains(VideoInclude::BLACKLISTED) {
            parts.include_blacklisted();
        }

        if let Some(server_account_id) = o
            .server_account_id
            .filter(|_| o.include.contains(VideoInclude::BLOCKED_OWNER))
        {
            parts.include_blocked_owner_and_server(server_account_id, o.user_account_id);
        }

        if o.include.contains(VideoInclude::SOURCE) {
            parts.include_video_source();
        }

        if let Some(account_id) = o
            .auto_tag_of_account_id
            .filter(|_| o.include.contains(VideoInclude::AUTOMATIC_TAGS))
        {
            parts.include_automatic_tags(account_id);
        }

        parts.where_lookup(&VideoLookup::Ids(o.ids.clone()));

        let positions = o
            .ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        parts.into_query(&format!(
            r#"ORDER BY array_position(ARRAY[{positions}]::integer[], "video"."id")"#
        ))
    }
}
