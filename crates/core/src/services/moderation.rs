//! Moderation workflow.
//!
//! Owner-only actions also succeed for admins. When an admin acts on someone
//! else's content the author is told, with the admin's reason attached.

use agora_common::{AppError, AppResult};
use agora_db::entities::notification::NotificationType;

use super::notification::{NotificationEvent, NotificationService};
use crate::{Actor, sanitize};

/// Privileged action taken on a post or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Delete,
    Unpublish,
}

impl ModerationAction {
    /// Notification type sent to the affected author.
    #[must_use]
    pub const fn notification_type(self) -> NotificationType {
        match self {
            Self::Delete => NotificationType::Delete,
            Self::Unpublish => NotificationType::Unpublish,
        }
    }
}

/// Capacity in which an actor was allowed to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The actor owns the resource or its parent.
    Owner,
    /// An admin acting on someone else's resource.
    Moderator,
}

/// Decide whether `actor` may perform an owner-only action.
///
/// `resource_author` owns the resource. `co_owners` may also act (the post
/// author for a comment) but an admin who is not `resource_author` always acts
/// as a moderator, even when also a co-owner.
pub fn authorize(actor: &Actor, resource_author: &str, co_owners: &[&str]) -> AppResult<Authority> {
    if actor.is(resource_author) {
        Ok(Authority::Owner)
    } else if actor.is_admin() {
        Ok(Authority::Moderator)
    } else if co_owners.iter().any(|owner| actor.is(owner)) {
        Ok(Authority::Owner)
    } else {
        Err(AppError::Forbidden(
            "only the author or an admin may do this".to_string(),
        ))
    }
}

/// The content a moderation action touched.
#[derive(Debug, Clone)]
pub struct ModeratedResource {
    pub author_id: String,
    pub post_id: String,
    pub comment_id: Option<String>,
}

/// Emits moderation notices.
#[derive(Clone)]
pub struct ModerationService {
    notifications: NotificationService,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }

    /// Record a completed action. Only moderator actions notify the author.
    pub async fn record(
        &self,
        actor: &Actor,
        authority: Authority,
        action: ModerationAction,
        resource: ModeratedResource,
        reason: Option<String>,
    ) {
        if authority != Authority::Moderator {
            return;
        }

        tracing::info!(
            moderator_id = %actor.id,
            author_id = %resource.author_id,
            post_id = %resource.post_id,
            action = ?action,
            "Moderation action taken"
        );

        self.notifications
            .fan_out([NotificationEvent::Moderated {
                sender_id: actor.id.clone(),
                recipient_id: resource.author_id,
                action,
                post_id: Some(resource.post_id),
                comment_id: resource.comment_id,
                reason: reason
                    .map(|r| sanitize::plain_text(&r))
                    .filter(|r| !r.is_empty()),
            }])
            .await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agora_db::entities::{notification, user::UserRole};
    use agora_db::repositories::{NotificationRepository, PostRepository, UserRepository};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn empty() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(db: &Arc<DatabaseConnection>) -> ModerationService {
        ModerationService::new(NotificationService::new(
            NotificationRepository::new(db.clone()),
            UserRepository::new(empty()),
            PostRepository::new(empty()),
        ))
    }

    fn resource() -> ModeratedResource {
        ModeratedResource {
            author_id: "author".to_string(),
            post_id: "p1".to_string(),
            comment_id: None,
        }
    }

    #[test]
    fn test_authorize_owner() {
        let actor = Actor::new("author", UserRole::User);
        assert_eq!(authorize(&actor, "author", &[]).unwrap(), Authority::Owner);

        let admin_author = Actor::new("author", UserRole::Admin);
        assert_eq!(
            authorize(&admin_author, "author", &[]).unwrap(),
            Authority::Owner
        );
    }

    #[test]
    fn test_authorize_admin_is_moderator() {
        let admin = Actor::new("admin", UserRole::Admin);
        assert_eq!(
            authorize(&admin, "author", &[]).unwrap(),
            Authority::Moderator
        );
        // Admin post author removing someone else's comment still moderates.
        assert_eq!(
            authorize(&admin, "commenter", &["admin"]).unwrap(),
            Authority::Moderator
        );
    }

    #[test]
    fn test_authorize_co_owner() {
        let post_author = Actor::new("post-author", UserRole::User);
        assert_eq!(
            authorize(&post_author, "commenter", &["post-author"]).unwrap(),
            Authority::Owner
        );
    }

    #[test]
    fn test_authorize_stranger_forbidden() {
        let stranger = Actor::new("stranger", UserRole::User);
        assert!(matches!(
            authorize(&stranger, "author", &["post-author"]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_action_notification_types() {
        assert_eq!(
            ModerationAction::Delete.notification_type(),
            NotificationType::Delete
        );
        assert_eq!(
            ModerationAction::Unpublish.notification_type(),
            NotificationType::Unpublish
        );
    }

    #[tokio::test]
    async fn test_record_owner_action_is_silent() {
        let db = empty();
        service(&db)
            .record(
                &Actor::new("author", UserRole::Admin),
                Authority::Owner,
                ModerationAction::Delete,
                resource(),
                Some("spam".to_string()),
            )
            .await;

        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = conn.into_transaction_log();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_record_moderator_action_notifies_author() {
        let created = notification::Model {
            id: "n1".to_string(),
            recipient_id: "author".to_string(),
            sender_id: "admin".to_string(),
            notification_type: NotificationType::Delete,
            message: Some("spam".to_string()),
            post_id: Some("p1".to_string()),
            comment_id: None,
            is_read: false,
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![created]])
                .into_connection(),
        );

        let service = service(&db);
        service
            .record(
                &Actor::new("admin", UserRole::Admin),
                Authority::Moderator,
                ModerationAction::Delete,
                resource(),
                Some("spam".to_string()),
            )
            .await;
        drop(service);

        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = conn.into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_record_strips_markup_from_reason() {
        let created = notification::Model {
            id: "n1".to_string(),
            recipient_id: "author".to_string(),
            sender_id: "admin".to_string(),
            notification_type: NotificationType::Unpublish,
            message: Some("spam & scam".to_string()),
            post_id: Some("p1".to_string()),
            comment_id: None,
            is_read: false,
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![created]])
                .into_connection(),
        );

        let service = service(&db);
        service
            .record(
                &Actor::new("admin", UserRole::Admin),
                Authority::Moderator,
                ModerationAction::Unpublish,
                resource(),
                Some("<b>spam</b> & <script>alert(1)</script>scam".to_string()),
            )
            .await;
        drop(service);

        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = format!("{:?}", conn.into_transaction_log());
        assert!(log.contains("spam & scam"));
        assert!(!log.contains("<b>"));
        assert!(!log.contains("alert"));
    }
}
