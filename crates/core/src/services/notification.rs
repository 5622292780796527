//! Notification fan-out.
//!
//! Notifications are derived from content mutations and persisted here. Fan-out
//! is best-effort: a failed write is logged and never fails the mutation that
//! triggered it. Records expire after a fixed TTL whether read or not.

use std::collections::HashMap;

use agora_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use agora_db::{
    entities::notification::{self, NotificationType},
    repositories::{NotificationRepository, PostRepository, UserRepository},
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::Set;
use serde::Serialize;

use super::moderation::ModerationAction;
use super::user::UserSummary;
use crate::Actor;

/// Default notification lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// A side effect worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// `sender` mentioned `recipient` in a comment on `post_id`.
    Mention {
        sender_id: String,
        recipient_id: String,
        post_id: String,
    },
    /// `sender` commented on `recipient`'s post.
    Comment {
        sender_id: String,
        recipient_id: String,
        post_id: String,
        comment_id: String,
    },
    /// `sender` liked a post, or a comment when `comment_id` is set.
    Liked {
        sender_id: String,
        recipient_id: String,
        post_id: String,
        comment_id: Option<String>,
    },
    /// `sender` took back a post like.
    Unliked {
        sender_id: String,
        recipient_id: String,
        post_id: String,
    },
    /// `sender` started following `recipient`.
    Followed {
        sender_id: String,
        recipient_id: String,
    },
    /// An admin acted on `recipient`'s content.
    Moderated {
        sender_id: String,
        recipient_id: String,
        action: ModerationAction,
        post_id: Option<String>,
        comment_id: Option<String>,
        reason: Option<String>,
    },
}

impl NotificationEvent {
    fn parties(&self) -> (&str, &str) {
        match self {
            Self::Mention {
                sender_id,
                recipient_id,
                ..
            }
            | Self::Comment {
                sender_id,
                recipient_id,
                ..
            }
            | Self::Liked {
                sender_id,
                recipient_id,
                ..
            }
            | Self::Unliked {
                sender_id,
                recipient_id,
                ..
            }
            | Self::Moderated {
                sender_id,
                recipient_id,
                ..
            }
            | Self::Followed {
                sender_id,
                recipient_id,
            } => (sender_id.as_str(), recipient_id.as_str()),
        }
    }
}

/// Post fields shown alongside a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
}

/// Notification projection with sender and post display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: Option<String>,
    pub sender: Option<UserSummary>,
    pub post_id: Option<String>,
    pub post: Option<PostSummary>,
    pub comment_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<FixedOffset>,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    post_repo: PostRepository,
    ttl: Duration,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service with the default TTL.
    #[must_use]
    pub fn new(
        notification_repo: NotificationRepository,
        user_repo: UserRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            notification_repo,
            user_repo,
            post_repo,
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
            id_gen: IdGenerator::new(),
        }
    }

    /// Override the notification lifetime.
    #[must_use]
    pub fn with_ttl_hours(mut self, hours: i64) -> Self {
        self.ttl = Duration::hours(hours);
        self
    }

    fn cutoff(&self) -> DateTime<Utc> {
        Utc::now() - self.ttl
    }

    /// Persist the effect of one event.
    ///
    /// Events addressed to their own sender are dropped.
    pub async fn dispatch(&self, event: &NotificationEvent) -> AppResult<()> {
        let (sender_id, recipient_id) = event.parties();
        if sender_id == recipient_id {
            return Ok(());
        }

        match event {
            NotificationEvent::Mention { post_id, .. } => {
                self.create(
                    sender_id,
                    recipient_id,
                    NotificationType::Mention,
                    Some(post_id.as_str()),
                    None,
                    None,
                )
                .await
            }
            NotificationEvent::Comment {
                post_id,
                comment_id,
                ..
            } => {
                self.create(
                    sender_id,
                    recipient_id,
                    NotificationType::Comment,
                    Some(post_id.as_str()),
                    Some(comment_id.as_str()),
                    None,
                )
                .await
            }
            NotificationEvent::Liked {
                post_id,
                comment_id,
                ..
            } => {
                // Check-then-create: a racing duplicate is tolerated.
                let existing = self
                    .notification_repo
                    .find_like(sender_id, recipient_id, post_id, comment_id.as_deref())
                    .await?;
                if existing.is_some() {
                    return Ok(());
                }
                self.create(
                    sender_id,
                    recipient_id,
                    NotificationType::Like,
                    Some(post_id.as_str()),
                    comment_id.as_deref(),
                    None,
                )
                .await
            }
            NotificationEvent::Unliked { post_id, .. } => {
                let removed = self
                    .notification_repo
                    .delete_post_like(sender_id, recipient_id, post_id)
                    .await?;
                tracing::debug!(post_id = %post_id, removed, "Removed like notification");
                Ok(())
            }
            NotificationEvent::Followed { .. } => {
                let existing = self
                    .notification_repo
                    .find_follow(sender_id, recipient_id)
                    .await?;
                if existing.is_some() {
                    return Ok(());
                }
                self.create(
                    sender_id,
                    recipient_id,
                    NotificationType::Follow,
                    None,
                    None,
                    None,
                )
                .await
            }
            NotificationEvent::Moderated {
                action,
                post_id,
                comment_id,
                reason,
                ..
            } => {
                self.create(
                    sender_id,
                    recipient_id,
                    action.notification_type(),
                    post_id.as_deref(),
                    comment_id.as_deref(),
                    reason.as_deref(),
                )
                .await
            }
        }
    }

    /// Dispatch events one by one, logging failures instead of returning them.
    pub async fn fan_out(&self, events: impl IntoIterator<Item = NotificationEvent>) {
        for event in events {
            if let Err(e) = self.dispatch(&event).await {
                tracing::warn!(error = %e, event = ?event, "Failed to deliver notification");
            }
        }
    }

    async fn create(
        &self,
        sender_id: &str,
        recipient_id: &str,
        notification_type: NotificationType,
        post_id: Option<&str>,
        comment_id: Option<&str>,
        message: Option<&str>,
    ) -> AppResult<()> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(recipient_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            notification_type: Set(notification_type),
            message: Set(message.map(ToString::to_string)),
            post_id: Set(post_id.map(ToString::to_string)),
            comment_id: Set(comment_id.map(ToString::to_string)),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let created = self.notification_repo.create(model).await?;
        tracing::debug!(
            notification_id = %created.id,
            recipient_id = %recipient_id,
            kind = ?notification_type,
            "Notification created"
        );
        Ok(())
    }

    /// Unexpired notifications for the actor, newest first.
    pub async fn list(&self, actor: &Actor, page: PageRequest) -> AppResult<Page<NotificationView>> {
        let (items, total) = self
            .notification_repo
            .find_by_recipient(&actor.id, self.cutoff(), page)
            .await?;

        let mut sender_ids: Vec<String> = items.iter().map(|n| n.sender_id.clone()).collect();
        sender_ids.sort();
        sender_ids.dedup();
        let mut post_ids: Vec<String> = items.iter().filter_map(|n| n.post_id.clone()).collect();
        post_ids.sort();
        post_ids.dedup();

        let senders: HashMap<String, UserSummary> = self
            .user_repo
            .find_by_ids(&sender_ids)
            .await?
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();
        let posts: HashMap<String, PostSummary> = self
            .post_repo
            .find_by_ids(&post_ids)
            .await?
            .into_iter()
            .map(|p| {
                (
                    p.id.clone(),
                    PostSummary {
                        id: p.id,
                        slug: p.slug,
                        title: p.title,
                    },
                )
            })
            .collect();

        let views = items
            .into_iter()
            .map(|n| NotificationView {
                sender: senders.get(&n.sender_id).cloned(),
                post: n.post_id.as_ref().and_then(|id| posts.get(id).cloned()),
                id: n.id,
                notification_type: n.notification_type,
                message: n.message,
                post_id: n.post_id,
                comment_id: n.comment_id,
                is_read: n.is_read,
                created_at: n.created_at,
            })
            .collect();

        Ok(Page::new(views, page, total))
    }

    /// Number of unexpired unread notifications.
    pub async fn count_unread(&self, actor: &Actor) -> AppResult<u64> {
        self.notification_repo
            .count_unread(&actor.id, self.cutoff())
            .await
    }

    /// Mark one notification read. Only its recipient may do so.
    pub async fn mark_read(&self, actor: &Actor, id: &str) -> AppResult<notification::Model> {
        let notification = self
            .notification_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("notification {id}")))?;

        if notification.recipient_id != actor.id {
            return Err(AppError::Forbidden(
                "not the recipient of this notification".to_string(),
            ));
        }

        if notification.is_read {
            return Ok(notification);
        }
        self.notification_repo.mark_as_read(notification).await
    }

    /// Mark every notification of the actor read.
    pub async fn mark_all_read(&self, actor: &Actor) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(&actor.id).await
    }

    /// Delete notifications past their TTL.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = self
            .notification_repo
            .delete_older_than(self.cutoff())
            .await?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired notifications");
        }
        Ok(removed)
    }
}
