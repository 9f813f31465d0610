//! A thread with a root comment and two replies, one of them deleted.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use peertube_db::query::comment::{
    CommentSelectType, ListVideoCommentsOptions, VideoCommentListQueryBuilder,
};
use peertube_db::repositories::VideoCommentRepository;
use peertube_db::test_utils::mock_row;
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::{Value, json};

fn comment(id: i32, origin: Option<i32>, deleted: bool, total_replies: Option<i64>) -> Value {
    let mut value = json!({
        "id": id,
        "url": format!("https://peertube.test/videos/watch/1;threadId={}", origin.unwrap_or(id)),
        "text": if deleted { String::new() } else { format!("comment {id}") },
        "deletedAt": if deleted { Some("2024-02-01T00:00:00Z") } else { None },
        "createdAt": format!("2024-01-0{id}T00:00:00Z"),
        "updatedAt": format!("2024-01-0{id}T00:00:00Z"),
        "originCommentId": origin,
        "inReplyToCommentId": origin,
        "videoId": 1,
        "accountId": if deleted { None } else { Some(10) },
        "heldForReview": false
    });

    if let Some(total) = total_replies {
        value["totalReplies"] = json!(total);
        value["totalRepliesFromVideoAuthor"] = json!(0);
    }

    value
}

fn thread_options() -> ListVideoCommentsOptions {
    ListVideoCommentsOptions {
        select_type: CommentSelectType::CommentOnly,
        video_id: Some(1),
        thread_id: Some(1),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_not_deleted_thread_listing() {
    let options = ListVideoCommentsOptions {
        not_deleted: true,
        ..thread_options()
    };

    let query = VideoCommentListQueryBuilder::new(options.clone())
        .unwrap()
        .build_list_query();
    assert!(query.sql.contains(r#""VideoCommentModel"."deletedAt" IS NULL"#));
    assert!(query.sql.contains(r#""VideoCommentModel"."originCommentId" = :threadId"#));

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                mock_row(comment(1, None, false, None)),
                mock_row(comment(2, Some(1), false, None)),
            ]])
            .into_connection(),
    );

    let comments = VideoCommentRepository::new(db).list(options).await.unwrap();

    let ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(comments.iter().all(|c| !c.is_deleted()));
    assert_eq!(comments[1].thread_id(), 1);
}

#[tokio::test]
async fn test_reply_counters_without_deletion_filter() {
    let options = ListVideoCommentsOptions {
        is_thread: true,
        include_reply_counters: true,
        thread_id: None,
        ..thread_options()
    };

    let query = VideoCommentListQueryBuilder::new(options.clone())
        .unwrap()
        .build_list_query();
    assert!(!query.sql.contains(r#""deletedAt" IS NULL"#));
    assert!(query.sql.contains(r#""inReplyToCommentId" IS NULL"#));

    // Without the filter the deleted reply is listed, so it is also counted.
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_row(comment(1, None, false, Some(2)))]])
            .into_connection(),
    );

    let comments = VideoCommentRepository::new(db).list(options).await.unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].total_replies, Some(2));
    assert_eq!(comments[0].total_replies_from_video_author, Some(0));
}

#[tokio::test]
async fn test_deleted_reply_is_kept_as_a_tombstone() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                mock_row(comment(1, None, false, None)),
                mock_row(comment(2, Some(1), false, None)),
                mock_row(comment(3, Some(1), true, None)),
            ]])
            .append_query_results([vec![mock_row(json!({ "total": 3 }))]])
            .into_connection(),
    );

    let page = VideoCommentRepository::new(db)
        .list_and_count(thread_options())
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert!(page.data[2].is_deleted());
    assert!(page.data[2].account_id.is_none());
}

#[test]
fn test_counters_and_list_share_the_deletion_policy() {
    for not_deleted in [false, true] {
        let query = VideoCommentListQueryBuilder::new(ListVideoCommentsOptions {
            not_deleted,
            include_reply_counters: true,
            ..thread_options()
        })
        .unwrap()
        .build_list_query();

        let filtered = query.sql.matches(r#""deletedAt" IS NULL"#).count();
        assert_eq!(filtered, if not_deleted { 3 } else { 0 });
    }
}

/// The two reply counter subqueries, in emission order.
fn reply_counter_laterals(sql: &str) -> Vec<&str> {
    sql.match_indices("LEFT JOIN LATERAL")
        .map(|(start, _)| {
            let end = sql[start..].find("ON TRUE").map_or(sql.len(), |i| start + i);
            &sql[start..end]
        })
        .collect()
}

#[test]
fn test_reply_counters_carry_deletion_and_block_filters() {
    for not_deleted in [false, true] {
        let query = VideoCommentListQueryBuilder::new(ListVideoCommentsOptions {
            not_deleted,
            is_thread: true,
            include_reply_counters: true,
            blocker_account_ids: Some(vec![5]),
            thread_id: None,
            ..thread_options()
        })
        .unwrap()
        .build_list_query();

        let laterals = reply_counter_laterals(&query.sql);
        assert_eq!(laterals.len(), 2);
        assert!(laterals[0].ends_with(r#""totalReplies" "#));
        assert!(laterals[1].ends_with(r#""totalRepliesFromVideoAuthor" "#));

        for lateral in laterals {
            assert_eq!(
                lateral.contains(r#""replies"."deletedAt" IS NULL"#),
                not_deleted,
                "{lateral}"
            );
            assert_eq!(lateral.matches("NOT EXISTS").count(), 2, "{lateral}");
            assert!(lateral.contains(r#"FROM "accountBlocklist" WHERE "targetAccountId" = "replies"."accountId""#));
            assert!(lateral.contains(r#""serverBlocklist"."accountId" IN (5, "videoChannel"."accountId")"#));
        }
    }
}
