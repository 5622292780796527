//! Like toggle engine.
//!
//! The same toggle serves posts and embedded comments. Set membership and the
//! counter change in one statement; whether the call liked or unliked is read
//! back from the returned row, so a double submit can never drift the count.
//!
//! Post likes keep the liker's `liked_posts` set and the like notification in
//! step both ways. Comment likes only ever create a notification.

use agora_common::{AppError, AppResult};
use agora_db::{
    entities::post,
    repositories::{PostRepository, UserRepository},
};
use serde::Serialize;

use super::gate;
use super::notification::{NotificationEvent, NotificationService};
use crate::Actor;

/// What is being liked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeTarget {
    Post { post_id: String },
    Comment { post_id: String, comment_id: String },
}

/// Result of a toggle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    /// Whether the actor likes the target after the call.
    pub liked: bool,
    pub like_count: i32,
    pub likes: Vec<String>,
    /// Post row after the update.
    #[serde(skip)]
    pub post: post::Model,
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            notifications,
        }
    }

    /// Like the target if the actor does not like it yet, otherwise unlike it.
    pub async fn toggle(&self, actor: &Actor, target: LikeTarget) -> AppResult<LikeOutcome> {
        match target {
            LikeTarget::Post { post_id } => self.toggle_post(actor, &post_id).await,
            LikeTarget::Comment {
                post_id,
                comment_id,
            } => self.toggle_comment(actor, &post_id, &comment_id).await,
        }
    }

    async fn toggle_post(&self, actor: &Actor, post_id: &str) -> AppResult<LikeOutcome> {
        let post = self.post_repo.get_by_id(post_id).await?;
        gate::check_visible(&post, Some(actor))?;

        let updated = self
            .post_repo
            .toggle_like(post_id, &actor.id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;
        let liked = updated.is_liked_by(&actor.id);

        let bookkeeping = if liked {
            self.user_repo.add_liked_post(&actor.id, post_id).await
        } else {
            self.user_repo.remove_liked_post(&actor.id, post_id).await
        };
        if let Err(e) = bookkeeping {
            tracing::warn!(error = %e, user_id = %actor.id, post_id = %post_id, "Failed to update liked posts");
        }

        let event = if liked {
            NotificationEvent::Liked {
                sender_id: actor.id.clone(),
                recipient_id: updated.user_id.clone(),
                post_id: post_id.to_string(),
                comment_id: None,
            }
        } else {
            NotificationEvent::Unliked {
                sender_id: actor.id.clone(),
                recipient_id: updated.user_id.clone(),
                post_id: post_id.to_string(),
            }
        };
        self.notifications.fan_out([event]).await;

        tracing::debug!(post_id = %post_id, liked, like_count = updated.like_count, "Post like toggled");

        Ok(LikeOutcome {
            liked,
            like_count: updated.like_count,
            likes: updated.like_ids(),
            post: updated,
        })
    }

    async fn toggle_comment(
        &self,
        actor: &Actor,
        post_id: &str,
        comment_id: &str,
    ) -> AppResult<LikeOutcome> {
        let post = self.post_repo.get_by_id(post_id).await?;
        gate::check_visible(&post, Some(actor))?;

        let updated = self
            .post_repo
            .toggle_comment_like(post_id, comment_id, &actor.id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        let comment = updated
            .find_comment(comment_id)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;
        let liked = comment.likes.iter().any(|id| id == &actor.id);

        if liked {
            self.notifications
                .fan_out([NotificationEvent::Liked {
                    sender_id: actor.id.clone(),
                    recipient_id: comment.user_id.clone(),
                    post_id: post_id.to_string(),
                    comment_id: Some(comment_id.to_string()),
                }])
                .await;
        }

        tracing::debug!(post_id = %post_id, comment_id = %comment_id, liked, "Comment like toggled");

        Ok(LikeOutcome {
            liked,
            like_count: comment.like_count,
            likes: comment.likes,
            post: updated,
        })
    }
}
