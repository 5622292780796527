//! Mention extraction.

use std::sync::LazyLock;

use agora_common::{AppError, AppResult};
use agora_db::repositories::UserRepository;
use regex::Regex;

#[allow(clippy::unwrap_used)]
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").unwrap());

/// Lower-cased handles mentioned in `text`, first occurrence order, no duplicates.
#[must_use]
pub fn extract_handles(text: &str) -> Vec<String> {
    let mut handles: Vec<String> = Vec::new();
    for cap in MENTION_RE.captures_iter(text) {
        let handle = cap[1].to_lowercase();
        if !handles.contains(&handle) {
            handles.push(handle);
        }
    }
    handles
}

/// Resolves `@handles` to user IDs.
#[derive(Clone)]
pub struct MentionResolver {
    user_repo: UserRepository,
}

impl MentionResolver {
    /// Create a new mention resolver.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// User IDs for the handles in `text`, in mention order.
    ///
    /// Unknown handles are dropped. A failed lookup is a `Dependency` error.
    pub async fn resolve(&self, text: &str) -> AppResult<Vec<String>> {
        let handles = extract_handles(text);
        if handles.is_empty() {
            return Ok(vec![]);
        }

        let users = self
            .user_repo
            .find_by_usernames_lower(&handles)
            .await
            .map_err(|e| AppError::Dependency(format!("mention lookup failed: {e}")))?;

        Ok(handles
            .iter()
            .filter_map(|handle| {
                users
                    .iter()
                    .find(|u| &u.username_lower == handle)
                    .map(|u| u.id.clone())
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agora_db::entities::user;
    use chrono::Utc;
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
            role: user::UserRole::User,
            token: None,
            liked_posts: json!([]),
            saved_posts: json!([]),
            followers: json!([]),
            following: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_extract_handles() {
        assert_eq!(
            extract_handles("hi @Alice and @bob, also @alice!"),
            vec!["alice", "bob"]
        );
    }

    #[test]
    fn test_extract_handles_word_characters_only() {
        assert_eq!(extract_handles("mail me at x@y.com"), vec!["y"]);
        assert_eq!(extract_handles("@under_score-dash"), vec!["under_score"]);
        assert!(extract_handles("no mentions @ all").is_empty());
    }

    #[tokio::test]
    async fn test_resolve_drops_unknown_handles() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_user("u2", "Bob"),
                    create_test_user("u1", "alice"),
                ]])
                .into_connection(),
        );

        let resolver = MentionResolver::new(UserRepository::new(db));
        let ids = resolver.resolve("@ALICE @ghost @bob").await.unwrap();

        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_resolve_without_mentions_skips_lookup() {
        // No queued results: any query would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let resolver = MentionResolver::new(UserRepository::new(db));
        assert!(resolver.resolve("plain text").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_lookup_failure_is_dependency_error() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let resolver = MentionResolver::new(UserRepository::new(db));
        let result = resolver.resolve("hey @alice").await;

        assert!(matches!(result, Err(AppError::Dependency(_))));
    }
}
