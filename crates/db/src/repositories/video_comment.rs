//! Video comment repository.

use std::sync::Arc;

use peertube_common::AppResult;
use sea_orm::DatabaseConnection;

use crate::models::VideoComment;
use crate::query::comment::{ListVideoCommentsOptions, VideoCommentListQueryBuilder};

/// A page of comments and the number of comments matching the filters.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentPage {
    pub data: Vec<VideoComment>,
    pub total: u64,
}

/// Repository for comment listings.
#[derive(Clone)]
pub struct VideoCommentRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoCommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List one page of comments.
    pub async fn list(&self, options: ListVideoCommentsOptions) -> AppResult<Vec<VideoComment>> {
        VideoCommentListQueryBuilder::new(options)?
            .list_comments(self.db.as_ref())
            .await
    }

    /// Count the comments matching the filters, ignoring pagination.
    pub async fn count(&self, options: ListVideoCommentsOptions) -> AppResult<u64> {
        VideoCommentListQueryBuilder::new(options)?
            .count_comments(self.db.as_ref())
            .await
    }

    /// List one page of comments along with the total count.
    pub async fn list_and_count(&self, options: ListVideoCommentsOptions) -> AppResult<CommentPage> {
        let builder = VideoCommentListQueryBuilder::new(options)?;

        let data = builder.list_comments(self.db.as_ref()).await?;
        let total = builder.count_comments(self.db.as_ref()).await?;

        Ok(CommentPage { data, total })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::mock_row;
    use peertube_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![mock_row(json!({
                    "id": 1,
                    "url": "https://peertube.test/comments/1",
                    "text": "first",
                    "deletedAt": null,
                    "createdAt": "2024-01-01T00:00:00Z",
                    "updatedAt": "2024-01-01T00:00:00Z",
                    "originCommentId": null,
                    "inReplyToCommentId": null,
                    "videoId": 4,
                    "accountId": null,
                    "heldForReview": false
                }))]])
                .append_query_results([vec![mock_row(json!({ "total": 12 }))]])
                .into_connection(),
        );

        let repo = VideoCommentRepository::new(db);
        let page = repo
            .list_and_count(ListVideoCommentsOptions {
                video_id: Some(4),
                count: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].text, "first");
        assert_eq!(page.total, 12);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_querying() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = VideoCommentRepository::new(db);
        let err = repo
            .list(ListVideoCommentsOptions {
                include_reply_counters: true,
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }
}
