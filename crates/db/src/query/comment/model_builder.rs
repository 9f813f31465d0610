//! Folds comment list rows into comment graphs.
//!
//! A page yields one row per comment, avatar and automatic tag combination.

use std::collections::HashMap;

use super::table_attributes::{
    ACCOUNT, ACTOR, AUTOMATIC_TAG, AVATAR, COMMENT, COMMENT_AUTOMATIC_TAG, SERVER, VIDEO,
};
use crate::models::{
    Account, Actor, ActorImage, AutomaticTag, CommentAutomaticTag, Server, VideoComment,
};
use crate::query::row::{JoinSpec, RowFolder, SqlRow, decode, row_count, row_id, row_key};

const AVATARS: JoinSpec = JoinSpec::by_id(
    "ActorImages",
    "Account.Actor.Avatars",
    "Account.Actor.Avatars.id",
)
.per_root();

const AUTOMATIC_TAGS: JoinSpec = JoinSpec::by_composite(
    "CommentAutomaticTags",
    "CommentAutomaticTags",
    "CommentAutomaticTags.AutomaticTag.id",
    &[
        "CommentAutomaticTags.commentId",
        "CommentAutomaticTags.accountId",
        "CommentAutomaticTags.automaticTagId",
    ],
);

/// One-shot materializer for a page of comment rows.
#[derive(Debug, Default)]
pub struct VideoCommentModelBuilder {
    folder: RowFolder,
    comments_memo: HashMap<i32, usize>,
    comments: Vec<VideoComment>,
}

impl VideoCommentModelBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the comments, in order of first appearance.
    #[must_use]
    pub fn build_comments_from_rows(mut self, rows: &[SqlRow]) -> Vec<VideoComment> {
        for row in rows {
            let Some(index) = self.build_comment(row) else {
                continue;
            };

            self.add_avatar(row, index);
            self.add_automatic_tag(row, index);
        }

        self.comments
    }

    fn build_comment(&mut self, row: &SqlRow) -> Option<usize> {
        let id = row_id(row, "id")?;

        if let Some(index) = self.comments_memo.get(&id) {
            return Some(*index);
        }

        let mut comment: VideoComment = decode(row, COMMENT, "")?;

        comment.total_replies = row_count(row, "totalReplies");
        comment.total_replies_from_video_author = row_count(row, "totalRepliesFromVideoAuthor");

        if row_key(row, "Video.id").is_some() {
            comment.video = decode(row, VIDEO, "Video");
        }

        if row_key(row, "Account.id").is_some() {
            comment.account = decode::<Account>(row, ACCOUNT, "Account").map(|mut account| {
                account.actor = build_actor(row);
                account
            });
        }

        let index = self.comments.len();
        self.comments.push(comment);
        self.comments_memo.insert(id, index);

        Some(index)
    }

    fn add_avatar(&mut self, row: &SqlRow, index: usize) {
        let Some(avatar) = self.folder.take::<ActorImage>(row, &AVATARS, AVATAR) else {
            return;
        };

        let actor = self.comments[index]
            .account
            .as_mut()
            .and_then(|account| account.actor.as_mut());

        if let Some(actor) = actor {
            actor.avatars.push(avatar);
        }
    }

    fn add_automatic_tag(&mut self, row: &SqlRow, index: usize) {
        let Some(mut tag) =
            self.folder
                .take::<CommentAutomaticTag>(row, &AUTOMATIC_TAGS, COMMENT_AUTOMATIC_TAG)
        else {
            return;
        };

        tag.automatic_tag =
            decode::<AutomaticTag>(row, AUTOMATIC_TAG, "CommentAutomaticTags.AutomaticTag");
        self.comments[index].comment_automatic_tags.push(tag);
    }
}

fn build_actor(row: &SqlRow) -> Option<Actor> {
    row_key(row, "Account.Actor.id")?;

    let mut actor: Actor = decode(row, ACTOR, "Account.Actor")?;

    if row_key(row, "Account.Actor.Server.id").is_some() {
        actor.server = decode::<Server>(row, SERVER, "Account.Actor.Server");
    }

    Some(actor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn row(value: Value) -> SqlRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn comment_row(id: i32, avatar_id: Option<i32>, tag_id: Option<i32>) -> SqlRow {
        row(json!({
            "id": id,
            "url": format!("https://peertube.test/videos/watch/1;threadId={id}"),
            "text": "hello",
            "deletedAt": null,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "originCommentId": null,
            "inReplyToCommentId": null,
            "videoId": 1,
            "accountId": 10,
            "heldForReview": false,
            "totalReplies": "2",
            "totalRepliesFromVideoAuthor": 0,
            "Account.id": 10,
            "Account.name": "Alice",
            "Account.actorId": 20,
            "Account.userId": null,
            "Account.Actor.id": 20,
            "Account.Actor.preferredUsername": "alice",
            "Account.Actor.url": "https://peertube.test/accounts/alice",
            "Account.Actor.serverId": null,
            "Account.Actor.Server.id": null,
            "Account.Actor.Server.host": null,
            "Account.Actor.Avatars.id": avatar_id,
            "Account.Actor.Avatars.width": 48,
            "Account.Actor.Avatars.filename": format!("{}.png", avatar_id.unwrap_or(0)),
            "Account.Actor.Avatars.fileUrl": null,
            "Account.Actor.Avatars.onDisk": true,
            "Account.Actor.Avatars.createdAt": null,
            "Account.Actor.Avatars.updatedAt": null,
            "CommentAutomaticTags.commentId": tag_id.map(|_| id),
            "CommentAutomaticTags.accountId": tag_id.map(|_| 99),
            "CommentAutomaticTags.automaticTagId": tag_id,
            "CommentAutomaticTags.AutomaticTag.id": tag_id,
            "CommentAutomaticTags.AutomaticTag.name": tag_id.map(|t| format!("tag-{t}"))
        }))
    }

    #[test]
    fn test_folds_avatar_and_tag_rows() {
        let rows = vec![
            comment_row(1, Some(5), Some(7)),
            comment_row(1, Some(6), Some(7)),
            comment_row(1, Some(5), Some(8)),
            comment_row(2, Some(5), None),
        ];

        let comments = VideoCommentModelBuilder::new().build_comments_from_rows(&rows);

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, 1);
        assert_eq!(comments[0].total_replies, Some(2));

        let actor = comments[0].account.as_ref().unwrap().actor.as_ref().unwrap();
        let avatar_ids: Vec<i32> = actor.avatars.iter().map(|a| a.id).collect();
        assert_eq!(avatar_ids, vec![5, 6]);
        assert!(actor.server.is_none());

        let tag_names: Vec<String> = comments[0]
            .comment_automatic_tags
            .iter()
            .map(|t| t.automatic_tag.as_ref().unwrap().name.clone())
            .collect();
        assert_eq!(tag_names, vec!["tag-7", "tag-8"]);

        // Same avatar, other comment: attached again.
        let second_actor = comments[1].account.as_ref().unwrap().actor.as_ref().unwrap();
        assert_eq!(second_actor.avatars.len(), 1);
        assert!(comments[1].comment_automatic_tags.is_empty());
    }

    #[test]
    fn test_comment_only_rows() {
        let rows = vec![row(json!({
            "id": 3,
            "url": "https://peertube.test/c/3",
            "text": "",
            "deletedAt": "2024-02-01T00:00:00Z",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-02-01T00:00:00Z",
            "originCommentId": 1,
            "inReplyToCommentId": 1,
            "videoId": 1,
            "accountId": null,
            "heldForReview": false
        }))];

        let comments = VideoCommentModelBuilder::new().build_comments_from_rows(&rows);

        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_deleted());
        assert_eq!(comments[0].thread_id(), 1);
        assert!(comments[0].account.is_none());
        assert!(comments[0].total_replies.is_none());
    }
}
