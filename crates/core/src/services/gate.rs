//! Publication gate.
//!
//! Drafts are visible, and likeable, to their author and to admins only.
//! Comments on a draft are refused for everyone.

use agora_common::{AppError, AppResult};
use agora_db::entities::post;

use crate::Actor;

/// Whether `viewer` may read `post`.
#[must_use]
pub fn can_view(post: &post::Model, viewer: Option<&Actor>) -> bool {
    post.is_published() || viewer.is_some_and(|v| v.is(&post.user_id) || v.is_admin())
}

/// Fail with `Forbidden` unless `viewer` may read `post`.
pub fn check_visible(post: &post::Model, viewer: Option<&Actor>) -> AppResult<()> {
    if can_view(post, viewer) {
        Ok(())
    } else {
        Err(AppError::Forbidden("post is not published".to_string()))
    }
}

/// Fail with `Forbidden` unless `post` accepts new comments.
pub fn check_open_for_comments(post: &post::Model) -> AppResult<()> {
    if post.is_published() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "cannot comment on an unpublished post".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_db::entities::user::UserRole;
    use chrono::Utc;
    use serde_json::json;

    fn create_test_post(status: post::PostStatus) -> post::Model {
        post::Model {
            id: "p1".to_string(),
            slug: "hello".to_string(),
            title: "Hello".to_string(),
            content: "x".repeat(200),
            tags: json!([]),
            user_id: "author".to_string(),
            status,
            first_publish_date: None,
            is_edited: false,
            edited_at: None,
            view_count: 0,
            likes: json!([]),
            like_count: 0,
            comments: json!([]),
            comment_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_published_visible_to_everyone() {
        let post = create_test_post(post::PostStatus::Published);
        assert!(can_view(&post, None));
        assert!(can_view(&post, Some(&Actor::new("other", UserRole::User))));
        assert!(check_open_for_comments(&post).is_ok());
    }

    #[test]
    fn test_draft_visibility() {
        let post = create_test_post(post::PostStatus::Draft);

        assert!(!can_view(&post, None));
        assert!(!can_view(&post, Some(&Actor::new("other", UserRole::User))));
        assert!(can_view(&post, Some(&Actor::new("author", UserRole::User))));
        assert!(can_view(&post, Some(&Actor::new("admin", UserRole::Admin))));

        assert!(matches!(
            check_visible(&post, None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_draft_closed_for_comments_even_for_author() {
        let post = create_test_post(post::PostStatus::Draft);
        assert!(matches!(
            check_open_for_comments(&post),
            Err(AppError::Forbidden(_))
        ));
    }
}
