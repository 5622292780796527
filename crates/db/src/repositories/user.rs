//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use agora_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, Statement,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users whose lower-cased username is in `handles`.
    pub async fn find_by_usernames_lower(&self, handles: &[String]) -> AppResult<Vec<user::Model>> {
        if handles.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::UsernameLower.is_in(handles.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Liked / saved post sets ====================

    /// Add a post to the user's liked set if it is not already there.
    pub async fn add_liked_post(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "user"
                SET "liked_posts" = "liked_posts" || jsonb_build_array($2::text)
                WHERE "id" = $1 AND NOT ("liked_posts" @> jsonb_build_array($2::text))"#,
                [user_id.into(), post_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a post from the user's liked set.
    pub async fn remove_liked_post(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "user"
                SET "liked_posts" = "liked_posts" - $2::text
                WHERE "id" = $1"#,
                [user_id.into(), post_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a deleted post from every user's liked and saved sets.
    pub async fn forget_post(&self, post_id: &str) -> AppResult<u64> {
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "user"
                SET "liked_posts" = "liked_posts" - $1::text,
                    "saved_posts" = "saved_posts" - $1::text
                WHERE "liked_posts" @> jsonb_build_array($1::text)
                   OR "saved_posts" @> jsonb_build_array($1::text)"#,
                [post_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Toggle a post in the user's saved set in one statement.
    pub async fn toggle_saved_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "user"
                SET "saved_posts" = CASE
                        WHEN "saved_posts" @> jsonb_build_array($2::text)
                            THEN "saved_posts" - $2::text
                        ELSE "saved_posts" || jsonb_build_array($2::text)
                    END
                WHERE "id" = $1
                RETURNING *"#,
                [user_id.into(), post_id.into()],
            ))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Follow sets ====================

    /// Toggle `followee_id` in the follower's `following` set in one statement.
    pub async fn toggle_following(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "user"
                SET "following" = CASE
                        WHEN "following" @> jsonb_build_array($2::text)
                            THEN "following" - $2::text
                        ELSE "following" || jsonb_build_array($2::text)
                    END
                WHERE "id" = $1
                RETURNING *"#,
                [follower_id.into(), followee_id.into()],
            ))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a follower to the followee's `followers` set if it is not already there.
    pub async fn add_follower(
        &self,
        followee_id: &str,
        follower_id: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "user"
                SET "followers" = CASE
                        WHEN "followers" @> jsonb_build_array($2::text)
                            THEN "followers"
                        ELSE "followers" || jsonb_build_array($2::text)
                    END
                WHERE "id" = $1
                RETURNING *"#,
                [followee_id.into(), follower_id.into()],
            ))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a follower from the followee's `followers` set.
    pub async fn remove_follower(
        &self,
        followee_id: &str,
        follower_id: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "user"
                SET "followers" = "followers" - $2::text
                WHERE "id" = $1
                RETURNING *"#,
                [followee_id.into(), follower_id.into()],
            ))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            display_name: Some("Test User".to_string()),
            bio: None,
            profile_picture: None,
            role: user::UserRole::User,
            token: Some("test_token".to_string()),
            liked_posts: json!([]),
            saved_posts: json!([]),
            followers: json!([]),
            following: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user("user1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_id("user1").await.unwrap();

        assert_eq!(result.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected UserNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_usernames_lower_empty_skips_query() {
        // No query results appended: any query would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        let result = repo.find_by_usernames_lower(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_usernames_lower() {
        let alice = create_test_user("user1", "Alice");
        let bob = create_test_user("user2", "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[alice, bob]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo
            .find_by_usernames_lower(&["alice".to_string(), "bob".to_string()])
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].username_lower, "alice");
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let user = create_test_user("user1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_token("test_token").await.unwrap();

        assert_eq!(result.unwrap().token, Some("test_token".to_string()));
    }

    #[tokio::test]
    async fn test_create_user() {
        let user = create_test_user("user1", "newuser");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);

        let active = user::ActiveModel {
            id: Set("user1".to_string()),
            username: Set("newuser".to_string()),
            username_lower: Set("newuser".to_string()),
            ..Default::default()
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.username, "newuser");
    }

    #[tokio::test]
    async fn test_forget_post_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let affected = repo.forget_post("post1").await.unwrap();

        assert_eq!(affected, 3);
    }

    #[tokio::test]
    async fn test_toggle_saved_post_returns_updated_row() {
        let mut user = create_test_user("user1", "alice");
        user.saved_posts = json!(["post1"]);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let updated = repo
            .toggle_saved_post("user1", "post1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.saved_post_ids(), vec!["post1".to_string()]);
    }

    #[tokio::test]
    async fn test_toggle_following_returns_updated_row() {
        let mut user = create_test_user("user1", "alice");
        user.following = json!(["user2"]);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let updated = repo
            .toggle_following("user1", "user2")
            .await
            .unwrap()
            .unwrap();

        assert!(updated.follows("user2"));
        assert_eq!(updated.following_ids(), vec!["user2".to_string()]);
    }

    #[tokio::test]
    async fn test_add_follower_missing_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let updated = repo.add_follower("ghost", "user1").await.unwrap();

        assert!(updated.is_none());
    }
}
