//! Columns projected by the comment list query.

#![allow(missing_docs)]

use crate::query::run_query::build_select_attributes;

pub(crate) const COMMENT: &[&str] = &[
    "id",
    "url",
    "deletedAt",
    "updatedAt",
    "createdAt",
    "text",
    "originCommentId",
    "inReplyToCommentId",
    "videoId",
    "accountId",
    "heldForReview",
];

pub(crate) const VIDEO: &[&str] = &["id", "uuid", "name", "privacy", "remote"];

pub(crate) const ACCOUNT: &[&str] = &["id", "name", "actorId", "userId"];

pub(crate) const ACTOR: &[&str] = &["id", "preferredUsername", "url", "serverId"];

pub(crate) const SERVER: &[&str] = &["id", "host"];

pub(crate) const AVATAR: &[&str] = &[
    "id",
    "width",
    "filename",
    "fileUrl",
    "onDisk",
    "createdAt",
    "updatedAt",
];

pub(crate) const COMMENT_AUTOMATIC_TAG: &[&str] = &["commentId", "accountId", "automaticTagId"];

pub(crate) const AUTOMATIC_TAG: &[&str] = &["id", "name"];

/// Select lists of the comment list query, one per joined table.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoCommentTableAttributes;

impl VideoCommentTableAttributes {
    /// Comment columns, projected under their own names.
    #[must_use]
    pub fn video_comment_attributes(&self) -> String {
        COMMENT
            .iter()
            .map(|attribute| format!(r#""VideoCommentModel"."{attribute}""#))
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[must_use]
    pub fn video_attributes(&self) -> String {
        build_select_attributes("Video", VIDEO).join(", ")
    }

    #[must_use]
    pub fn account_attributes(&self) -> String {
        build_select_attributes("Account", ACCOUNT).join(", ")
    }

    #[must_use]
    pub fn actor_attributes(&self) -> String {
        build_select_attributes("Account->Actor", ACTOR).join(", ")
    }

    #[must_use]
    pub fn server_attributes(&self) -> String {
        build_select_attributes("Account->Actor->Server", SERVER).join(", ")
    }

    #[must_use]
    pub fn avatar_attributes(&self) -> String {
        build_select_attributes("Account->Actor->Avatars", AVATAR).join(", ")
    }

    #[must_use]
    pub fn comment_automatic_tag_attributes(&self) -> String {
        build_select_attributes("CommentAutomaticTags", COMMENT_AUTOMATIC_TAG).join(", ")
    }

    #[must_use]
    pub fn automatic_tag_attributes(&self) -> String {
        build_select_attributes("CommentAutomaticTags->AutomaticTag", AUTOMATIC_TAG).join(", ")
    }
}
