//! Comment manager.
//!
//! Comments live inside their post. Adding or removing one updates the array
//! and `comment_count` in a single statement.

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{entities::post, repositories::PostRepository};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use super::gate;
use super::mention::MentionResolver;
use super::moderation::{self, ModeratedResource, ModerationAction, ModerationService};
use super::notification::{NotificationEvent, NotificationService};
use crate::{Actor, sanitize};

/// Comment body for add and edit.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be between 1 and 2000 characters"
    ))]
    pub text: String,
}

impl CommentInput {
    fn sanitized(&self) -> AppResult<String> {
        let cleaned = Self {
            text: sanitize::plain_text(&self.text),
        };
        cleaned.validate()?;
        Ok(cleaned.text)
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    post_repo: PostRepository,
    mentions: MentionResolver,
    notifications: NotificationService,
    moderation: ModerationService,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        mentions: MentionResolver,
        notifications: NotificationService,
        moderation: ModerationService,
    ) -> Self {
        Self {
            post_repo,
            mentions,
            notifications,
            moderation,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a published post.
    ///
    /// Notifies the post author and every mentioned user other than the
    /// commenter.
    pub async fn add(
        &self,
        actor: &Actor,
        post_id: &str,
        input: &CommentInput,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        gate::check_open_for_comments(&post)?;

        let text = input.sanitized()?;
        let mentions = self.mentions.resolve(&text).await?;

        let now = Utc::now();
        let comment = post::Comment {
            id: self.id_gen.generate(),
            text,
            user_id: actor.id.clone(),
            mentions,
            likes: vec![],
            like_count: 0,
            created_at: now,
            updated_at: now,
        };

        let Some(updated) = self.post_repo.push_comment(post_id, &comment).await? else {
            // Deleted or unpublished since it was read.
            return match self.post_repo.find_by_id(post_id).await? {
                None => Err(AppError::PostNotFound(post_id.to_string())),
                Some(_) => Err(AppError::Forbidden(
                    "cannot comment on an unpublished post".to_string(),
                )),
            };
        };

        tracing::info!(
            post_id = %post_id,
            comment_id = %comment.id,
            comment_count = updated.comment_count,
            "Comment added"
        );

        let mut events = vec![NotificationEvent::Comment {
            sender_id: actor.id.clone(),
            recipient_id: updated.user_id.clone(),
            post_id: post_id.to_string(),
            comment_id: comment.id.clone(),
        }];
        events.extend(
            comment
                .mentions
                .iter()
                .map(|recipient_id| NotificationEvent::Mention {
                    sender_id: actor.id.clone(),
                    recipient_id: recipient_id.clone(),
                    post_id: post_id.to_string(),
                }),
        );
        self.notifications.fan_out(events).await;

        Ok(updated)
    }

    /// Replace a comment's text. Only its author may; mentions stay as first resolved.
    pub async fn edit(
        &self,
        actor: &Actor,
        post_id: &str,
        comment_id: &str,
        input: &CommentInput,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        gate::check_visible(&post, Some(actor))?;
        let comment = find_comment(&post, comment_id)?;

        if !actor.is(&comment.user_id) {
            return Err(AppError::Forbidden(
                "only the comment author may edit it".to_string(),
            ));
        }

        let text = input.sanitized()?;
        self.post_repo
            .update_comment_text(post_id, comment_id, &text, &Utc::now().to_rfc3339())
            .await?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))
    }

    /// Remove a comment. Allowed for the comment author, the post author and admins.
    pub async fn delete(
        &self,
        actor: &Actor,
        post_id: &str,
        comment_id: &str,
        reason: Option<String>,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        gate::check_visible(&post, Some(actor))?;
        let comment = find_comment(&post, comment_id)?;

        let authority = moderation::authorize(actor, &comment.user_id, &[post.user_id.as_str()])?;

        let updated = self
            .post_repo
            .remove_comment(post_id, comment_id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        tracing::info!(
            post_id = %post_id,
            comment_id = %comment_id,
            comment_count = updated.comment_count,
            "Comment deleted"
        );

        self.moderation
            .record(
                actor,
                authority,
                ModerationAction::Delete,
                ModeratedResource {
                    author_id: comment.user_id,
                    post_id: post_id.to_string(),
                    comment_id: Some(comment_id.to_string()),
                },
                reason,
            )
            .await;

        Ok(updated)
    }
}

fn find_comment(post: &post::Model, comment_id: &str) -> AppResult<post::Comment> {
    post.find_comment(comment_id)
        .map_err(|e| AppError::Internal(format!("corrupt comments on post {}: {e}", post.id)))?
        .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))
}
