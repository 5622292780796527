//! User service.

use agora_common::{AppError, AppResult};
use agora_db::{entities::user, repositories::UserRepository};
use chrono::Utc;
use sea_orm::{ActiveValue::NotSet, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Actor, sanitize};

/// Author display fields embedded in post, comment and notification projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// Public profile projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub role: user::UserRole,
    pub liked_posts_count: usize,
    pub followers_count: usize,
    pub following_count: usize,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            liked_posts_count: user.liked_post_ids().len(),
            followers_count: user.follower_ids().len(),
            following_count: user.following_ids().len(),
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            bio: user.bio,
            profile_picture: user.profile_picture,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Input for updating a profile. Absent fields are left alone; an empty
/// string clears the field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 50, message = "Display name must be at most 50 characters"))]
    pub display_name: Option<String>,

    #[validate(length(max = 140, message = "Bio must be at most 140 characters"))]
    pub bio: Option<String>,

    #[validate(url(message = "Profile picture must be a URL"))]
    pub profile_picture: Option<String>,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get users by IDs, in no particular order.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_by_ids(ids).await
    }

    /// Update one's own profile.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        if !actor.is(user_id) {
            return Err(AppError::Forbidden(
                "cannot edit another user's profile".to_string(),
            ));
        }

        let input = UpdateProfileInput {
            display_name: input.display_name.map(|s| sanitize::plain_text(&s)),
            bio: input.bio.map(|s| sanitize::plain_text(&s)),
            profile_picture: input
                .profile_picture
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        active.display_name = input
            .display_name
            .map_or(NotSet, |s| Set((!s.is_empty()).then_some(s)));
        active.bio = input.bio.map_or(NotSet, |s| Set((!s.is_empty()).then_some(s)));
        if let Some(url) = input.profile_picture {
            active.profile_picture = Set(Some(url));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.user_repo.update(active).await?;
        tracing::info!(user_id = %updated.id, "Profile updated");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agora_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            display_name: None,
            bio: None,
            profile_picture: None,
            role: UserRole::User,
            token: Some(format!("token-{id}")),
            liked_posts: json!(["p1", "p2"]),
            saved_posts: json!([]),
            followers: json!([]),
            following: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.authenticate_by_token("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_update_profile_other_user_forbidden() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = UserService::new(UserRepository::new(db));

        let result = service
            .update_profile(
                &Actor::new("u1", UserRole::Admin),
                "u2",
                UpdateProfileInput::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_profile_bio_too_long() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = UserService::new(UserRepository::new(db));

        let result = service
            .update_profile(
                &Actor::new("u1", UserRole::User),
                "u1",
                UpdateProfileInput {
                    bio: Some("b".repeat(141)),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_profile_sanitizes() {
        let mut updated = create_test_user("u1", "alice");
        updated.display_name = Some("Alice".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![create_test_user("u1", "alice")]])
                .append_query_results([vec![updated]])
                .into_connection(),
        );
        let service = UserService::new(UserRepository::new(db));

        let result = service
            .update_profile(
                &Actor::new("u1", UserRole::User),
                "u1",
                UpdateProfileInput {
                    display_name: Some("<b>Alice</b>".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_profile_projection_counts_likes() {
        let profile = UserProfile::from(create_test_user("u1", "alice"));
        assert_eq!(profile.liked_posts_count, 2);
        assert_eq!(profile.username, "alice");
    }

    #[test]
    fn test_profile_projection_counts_follows() {
        let mut user = create_test_user("u1", "alice");
        user.followers = json!(["u2", "u3"]);
        user.following = json!(["u2"]);

        let profile = UserProfile::from(user);
        assert_eq!(profile.followers_count, 2);
        assert_eq!(profile.following_count, 1);
    }
}
