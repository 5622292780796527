//! Follow toggle.
//!
//! A follow lives on both accounts: the follower's `following` set and the
//! followee's `followers` set. The follower row is toggled first and decides
//! the direction; the followee row is then brought in line with an idempotent
//! add or remove, so a retried call converges.

use agora_common::{AppError, AppResult};
use agora_db::repositories::UserRepository;
use serde::Serialize;

use super::notification::{NotificationEvent, NotificationService};
use crate::Actor;

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowOutcome {
    /// Whether the actor follows the target after the call.
    pub following: bool,
    /// Followers of the target.
    pub followers_count: usize,
    /// Accounts the actor follows.
    pub following_count: usize,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    user_repo: UserRepository,
    notifications: NotificationService,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, notifications: NotificationService) -> Self {
        Self {
            user_repo,
            notifications,
        }
    }

    /// Follow the target if the actor does not follow it yet, otherwise unfollow.
    ///
    /// Unfollowing leaves an earlier follow notification to expire.
    pub async fn toggle(&self, actor: &Actor, target_id: &str) -> AppResult<FollowOutcome> {
        if actor.is(target_id) {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        self.user_repo.get_by_id(target_id).await?;

        let follower = self
            .user_repo
            .toggle_following(&actor.id, target_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(actor.id.clone()))?;
        let following = follower.follows(target_id);

        let followee = if following {
            self.user_repo.add_follower(target_id, &actor.id).await?
        } else {
            self.user_repo.remove_follower(target_id, &actor.id).await?
        }
        .ok_or_else(|| AppError::UserNotFound(target_id.to_string()))?;

        tracing::info!(
            follower_id = %actor.id,
            followee_id = %target_id,
            following,
            "Follow toggled"
        );

        if following {
            self.notifications
                .fan_out([NotificationEvent::Followed {
                    sender_id: actor.id.clone(),
                    recipient_id: target_id.to_string(),
                }])
                .await;
        }

        Ok(FollowOutcome {
            following,
            followers_count: followee.follower_ids().len(),
            following_count: follower.following_ids().len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agora_db::entities::{
        notification::{self, NotificationType},
        user::{self, UserRole},
    };
    use agora_db::repositories::{NotificationRepository, PostRepository};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn create_test_user(id: &str, followers: Value, following: Value) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            username_lower: id.to_string(),
            display_name: None,
            bio: None,
            profile_picture: None,
            role: UserRole::User,
            token: None,
            liked_posts: json!([]),
            saved_posts: json!([]),
            followers,
            following,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn follow_notification() -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            recipient_id: "star".to_string(),
            sender_id: "fan".to_string(),
            notification_type: NotificationType::Follow,
            message: None,
            post_id: None,
            comment_id: None,
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    fn empty() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(
        user_db: Arc<DatabaseConnection>,
        notification_db: Arc<DatabaseConnection>,
    ) -> FollowService {
        let notifications = NotificationService::new(
            NotificationRepository::new(notification_db),
            UserRepository::new(user_db.clone()),
            PostRepository::new(empty()),
        );
        FollowService::new(UserRepository::new(user_db), notifications)
    }

    fn tx_count(db: Arc<DatabaseConnection>) -> usize {
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        conn.into_transaction_log().len()
    }

    fn fan() -> Actor {
        Actor::new("fan", UserRole::User)
    }

    #[tokio::test]
    async fn test_follow_updates_both_sides_and_notifies() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![create_test_user("star", json!([]), json!([]))]])
                .append_query_results([vec![create_test_user("fan", json!([]), json!(["star"]))]])
                .append_query_results([vec![create_test_user("star", json!(["fan"]), json!([]))]])
                .into_connection(),
        );
        let notification_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .append_query_results([vec![follow_notification()]])
                .into_connection(),
        );

        let outcome = service(user_db.clone(), notification_db.clone())
            .toggle(&fan(), "star")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FollowOutcome {
                following: true,
                followers_count: 1,
                following_count: 1,
            }
        );
        assert_eq!(tx_count(user_db), 3);
        assert_eq!(tx_count(notification_db), 2);
    }

    #[tokio::test]
    async fn test_unfollow_leaves_notifications_alone() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![create_test_user("star", json!(["fan"]), json!([]))]])
                .append_query_results([vec![create_test_user("fan", json!([]), json!([]))]])
                .append_query_results([vec![create_test_user("star", json!([]), json!([]))]])
                .into_connection(),
        );
        let notification_db = empty();

        let outcome = service(user_db, notification_db.clone())
            .toggle(&fan(), "star")
            .await
            .unwrap();

        assert!(!outcome.following);
        assert_eq!(outcome.followers_count, 0);
        assert_eq!(tx_count(notification_db), 0);
    }

    #[tokio::test]
    async fn test_follow_self_rejected() {
        let result = service(empty(), empty()).toggle(&fan(), "fan").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let result = service(user_db, empty()).toggle(&fan(), "ghost").await;

        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected UserNotFound, got {other:?}"),
        }
    }
}
