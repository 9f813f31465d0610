//! Video comment graph nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::Account;
use super::video::AutomaticTag;

/// A video comment as listed by the comment query builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoComment {
    pub id: i32,
    pub url: String,
    pub text: String,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub origin_comment_id: Option<i32>,
    #[serde(default)]
    pub in_reply_to_comment_id: Option<i32>,
    pub video_id: i32,
    /// `None` once the author account has been deleted.
    #[serde(default)]
    pub account_id: Option<i32>,
    #[serde(default)]
    pub held_for_review: bool,

    #[serde(default)]
    pub video: Option<CommentVideo>,
    #[serde(default)]
    pub account: Option<Account>,
    #[serde(default)]
    pub comment_automatic_tags: Vec<CommentAutomaticTag>,

    #[serde(default)]
    pub total_replies: Option<i64>,
    #[serde(default)]
    pub total_replies_from_video_author: Option<i64>,
}

impl VideoComment {
    /// Whether the comment has been soft deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Root comment id of the thread this comment belongs to.
    #[must_use]
    pub fn thread_id(&self) -> i32 {
        self.origin_comment_id.unwrap_or(self.id)
    }
}

/// The video a comment was posted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVideo {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub privacy: Option<i32>,
    #[serde(default)]
    pub remote: Option<bool>,
}

/// An automatic tag attached to a comment for one evaluating account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAutomaticTag {
    pub comment_id: i32,
    pub account_id: i32,
    pub automatic_tag_id: i32,

    #[serde(default)]
    pub automatic_tag: Option<AutomaticTag>,
}
