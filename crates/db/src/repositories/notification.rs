//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use agora_common::{AppError, AppResult, PageRequest};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Notifications for a recipient created after `since`, newest first.
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
        since: DateTime<Utc>,
        page: PageRequest,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        let query = Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::CreatedAt.gt(since));

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let items = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// Look up an existing like notification.
    ///
    /// `comment_id = None` matches post likes only.
    pub async fn find_like(
        &self,
        sender_id: &str,
        recipient_id: &str,
        post_id: &str,
        comment_id: Option<&str>,
    ) -> AppResult<Option<notification::Model>> {
        let mut query = Notification::find()
            .filter(notification::Column::NotificationType.eq(notification::NotificationType::Like))
            .filter(notification::Column::SenderId.eq(sender_id))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::PostId.eq(post_id));

        query = match comment_id {
            Some(cid) => query.filter(notification::Column::CommentId.eq(cid)),
            None => query.filter(notification::Column::CommentId.is_null()),
        };

        query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up an existing follow notification.
    pub async fn find_follow(
        &self,
        sender_id: &str,
        recipient_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        Notification::find()
            .filter(
                notification::Column::NotificationType.eq(notification::NotificationType::Follow),
            )
            .filter(notification::Column::SenderId.eq(sender_id))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the post-like notification for a (sender, recipient, post) triple.
    pub async fn delete_post_like(
        &self,
        sender_id: &str,
        recipient_id: &str,
        post_id: &str,
    ) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::NotificationType.eq(notification::NotificationType::Like))
            .filter(notification::Column::SenderId.eq(sender_id))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::PostId.eq(post_id))
            .filter(notification::Column::CommentId.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Mark a notification as read.
    pub async fn mark_as_read(
        &self,
        notification: notification::Model,
    ) -> AppResult<notification::Model> {
        let mut active: notification::ActiveModel = notification.into();
        active.is_read = Set(true);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark all notifications as read for a recipient.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, true.into())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications created after `since`.
    pub async fn count_unread(&self, recipient_id: &str, since: DateTime<Utc>) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .filter(notification::Column::CreatedAt.gt(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every notification created at or before `cutoff`.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::CreatedAt.lte(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
