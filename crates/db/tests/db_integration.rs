//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `agora_test`)
//!   `TEST_DB_PASSWORD` (default: `agora_test`)
//!   `TEST_DB_NAME` (default: `agora_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use agora_common::AppError;
use agora_db::entities::{post, user};
use agora_db::repositories::{PostChanges, PostRepository, UserRepository};
use agora_db::test_utils::{TestDatabase, TestDbConfig};
use chrono::Utc;
use sea_orm::Set;
use serde_json::json;

async fn setup() -> (TestDatabase, PostRepository, UserRepository) {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = Arc::new(
        sea_orm::Database::connect(&db.config.database_url())
            .await
            .unwrap(),
    );
    (
        db,
        PostRepository::new(conn.clone()),
        UserRepository::new(conn),
    )
}

fn comment(id: &str, user_id: &str) -> post::Comment {
    let now = Utc::now();
    post::Comment {
        id: id.to_string(),
        text: "nice post".to_string(),
        user_id: user_id.to_string(),
        mentions: vec![],
        likes: vec![],
        like_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_like_toggle_parity() {
    let (db, posts, _) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    let liker = db.seed_user("liker", user::UserRole::User).await.unwrap();
    let p = db
        .seed_post(&author.id, "parity", post::PostStatus::Published)
        .await
        .unwrap();

    for call in 1..=5 {
        let updated = posts.toggle_like(&p.id, &liker.id).await.unwrap().unwrap();
        assert_eq!(updated.like_count as usize, updated.like_ids().len());
        assert_eq!(updated.is_liked_by(&liker.id), call % 2 == 1);
    }

    db.drop_database().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_likes_keep_count_consistent() {
    let (db, posts, _) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    let p = db
        .seed_post(&author.id, "race", post::PostStatus::Published)
        .await
        .unwrap();

    let mut likers = Vec::new();
    for i in 0..8 {
        likers.push(
            db.seed_user(&format!("liker{i}"), user::UserRole::User)
                .await
                .unwrap(),
        );
    }

    // Each liker double-submits; both toggles land, so nobody ends up liking.
    let calls = likers
        .iter()
        .chain(likers.iter())
        .map(|u| posts.toggle_like(&p.id, &u.id));
    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(Result::is_ok));

    let after = posts.get_by_id(&p.id).await.unwrap();
    assert_eq!(after.like_count as usize, after.like_ids().len());
    assert_eq!(after.like_count, 0);

    // One like each, concurrently.
    let calls = likers.iter().map(|u| posts.toggle_like(&p.id, &u.id));
    futures::future::join_all(calls).await;

    let after = posts.get_by_id(&p.id).await.unwrap();
    assert_eq!(after.like_count, 8);
    assert_eq!(after.like_ids().len(), 8);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_add_then_delete_comment_restores_count() {
    let (db, posts, _) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    let p = db
        .seed_post(&author.id, "comments", post::PostStatus::Published)
        .await
        .unwrap();

    posts
        .push_comment(&p.id, &comment("c0", &author.id))
        .await
        .unwrap()
        .unwrap();
    let before = posts.get_by_id(&p.id).await.unwrap().comment_count;

    let added = posts
        .push_comment(&p.id, &comment("c1", &author.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(added.comment_count, before + 1);

    let removed = posts.remove_comment(&p.id, "c1").await.unwrap().unwrap();
    assert_eq!(removed.comment_count, before);
    assert_eq!(removed.comment_list().unwrap().len(), before as usize);
    assert_eq!(removed.comment_list().unwrap()[0].id, "c0");

    // Second delete matches nothing.
    assert!(posts.remove_comment(&p.id, "c1").await.unwrap().is_none());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_push_comment_rejects_draft() {
    let (db, posts, _) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    let p = db
        .seed_post(&author.id, "draft", post::PostStatus::Draft)
        .await
        .unwrap();

    let result = posts
        .push_comment(&p.id, &comment("c1", &author.id))
        .await
        .unwrap();
    assert!(result.is_none());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_comment_like_and_edit() {
    let (db, posts, _) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    let liker = db.seed_user("liker", user::UserRole::User).await.unwrap();
    let p = db
        .seed_post(&author.id, "comment-like", post::PostStatus::Published)
        .await
        .unwrap();
    posts
        .push_comment(&p.id, &comment("c1", &author.id))
        .await
        .unwrap();

    let liked = posts
        .toggle_comment_like(&p.id, "c1", &liker.id)
        .await
        .unwrap()
        .unwrap();
    let c = liked.find_comment("c1").unwrap().unwrap();
    assert_eq!(c.likes, vec![liker.id.clone()]);
    assert_eq!(c.like_count, 1);

    let unliked = posts
        .toggle_comment_like(&p.id, "c1", &liker.id)
        .await
        .unwrap()
        .unwrap();
    let c = unliked.find_comment("c1").unwrap().unwrap();
    assert!(c.likes.is_empty());
    assert_eq!(c.like_count, 0);

    let edited = posts
        .update_comment_text(&p.id, "c1", "edited", &Utc::now().to_rfc3339())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.find_comment("c1").unwrap().unwrap().text, "edited");

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_publish_sets_first_publish_date_once_and_edits_mark_post() {
    let (db, posts, _) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    let p = db
        .seed_post(&author.id, "lifecycle", post::PostStatus::Draft)
        .await
        .unwrap();
    assert!(p.first_publish_date.is_none());

    // Editing a never-published draft is not an "edit".
    let draft_edit = posts
        .apply_changes(
            &p.id,
            &PostChanges {
                title: Some("still a draft".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(!draft_edit.is_edited);

    let published = posts
        .set_status(&p.id, post::PostStatus::Published)
        .await
        .unwrap()
        .unwrap();
    let first = published.first_publish_date.unwrap();
    assert!(!published.is_edited);

    posts
        .set_status(&p.id, post::PostStatus::Draft)
        .await
        .unwrap();
    let republished = posts
        .set_status(&p.id, post::PostStatus::Published)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(republished.first_publish_date.unwrap(), first);

    let edited = posts
        .apply_changes(
            &p.id,
            &PostChanges {
                tags: Some(vec!["rust".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(edited.is_edited);
    assert!(edited.edited_at.is_some());
    assert_eq!(edited.tag_list(), vec!["rust".to_string()]);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_slug_is_conflict() {
    let (db, posts, _) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    db.seed_post(&author.id, "taken", post::PostStatus::Published)
        .await
        .unwrap();

    let now = Utc::now();
    let duplicate = post::ActiveModel {
        id: Set("dup".to_string()),
        slug: Set("taken".to_string()),
        title: Set("taken".to_string()),
        content: Set("x".repeat(200)),
        tags: Set(json!([])),
        user_id: Set(author.id.clone()),
        status: Set(post::PostStatus::Draft),
        first_publish_date: Set(None),
        is_edited: Set(false),
        edited_at: Set(None),
        view_count: Set(0),
        likes: Set(json!([])),
        like_count: Set(0),
        comments: Set(json!([])),
        comment_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(None),
    };

    assert!(posts.slug_exists("taken").await.unwrap());
    assert!(matches!(
        posts.create(duplicate).await,
        Err(AppError::Conflict(_))
    ));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_liked_posts_bookkeeping() {
    let (db, posts, users) = setup().await;
    let author = db.seed_user("author", user::UserRole::User).await.unwrap();
    let liker = db.seed_user("liker", user::UserRole::User).await.unwrap();
    let p = db
        .seed_post(&author.id, "bookkeeping", post::PostStatus::Published)
        .await
        .unwrap();

    users.add_liked_post(&liker.id, &p.id).await.unwrap();
    users.add_liked_post(&liker.id, &p.id).await.unwrap();
    assert_eq!(
        users.get_by_id(&liker.id).await.unwrap().liked_post_ids(),
        vec![p.id.clone()]
    );

    users.toggle_saved_post(&liker.id, &p.id).await.unwrap();
    assert_eq!(users.forget_post(&p.id).await.unwrap(), 1);

    let after = users.get_by_id(&liker.id).await.unwrap();
    assert!(after.liked_post_ids().is_empty());
    assert!(after.saved_post_ids().is_empty());

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
