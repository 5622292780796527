//! Post repository.
//!
//! Every mutation of a counter and the collection it mirrors is issued as one
//! `UPDATE ... RETURNING *`. All `SET` expressions read the same row version,
//! and Postgres row locks serialise concurrent writers, so `like_count` and
//! `comment_count` can never drift from the arrays they count.

use std::sync::Arc;

use crate::entities::{Post, post};
use agora_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement, Value,
    sea_query::{Expr, Func},
};

/// Like-set toggle for a JSON array column or expression.
fn toggled(set: &str, member: &str) -> String {
    format!(
        "CASE WHEN {set} @> jsonb_build_array({member}) \
         THEN {set} - {member} \
         ELSE {set} || jsonb_build_array({member}) END"
    )
}

/// Changes to the author-editable fields of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    /// New sanitized title.
    pub title: Option<String>,
    /// New sanitized content.
    pub content: Option<String>,
    /// New normalized tag list.
    pub tags: Option<Vec<String>>,
    /// New publication state.
    pub status: Option<post::PostStatus>,
}

impl PostChanges {
    /// Whether any content field (not just the status) changes.
    #[must_use]
    pub const fn touches_content(&self) -> bool {
        self.title.is_some() || self.content.is_some() || self.tags.is_some()
    }

    /// Whether nothing changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.touches_content() && self.status.is_none()
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Find a post by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, falling back to slug.
    pub async fn get_by_id_or_slug(&self, key: &str) -> AppResult<post::Model> {
        if let Some(found) = self.find_by_id(key).await? {
            return Ok(found);
        }
        self.find_by_slug(key)
            .await?
            .ok_or_else(|| AppError::PostNotFound(key.to_string()))
    }

    /// Find posts by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<post::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Post::find()
            .filter(post::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a slug is already taken.
    pub async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let count = Post::find()
            .filter(post::Column::Slug.eq(slug))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Insert a new post. A slug collision surfaces as `Conflict`.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(format!("slug already taken: {detail}"))
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Delete a post with its embedded comments and likes.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    // ==================== Listing ====================

    /// Published posts, newest first, with the total count.
    pub async fn find_published(&self, page: PageRequest) -> AppResult<(Vec<post::Model>, u64)> {
        self.paged(
            Condition::all().add(post::Column::Status.eq(post::PostStatus::Published)),
            page,
        )
        .await
    }

    /// Posts by one author, newest first. Drafts only when asked for.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        include_drafts: bool,
        page: PageRequest,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let mut condition = Condition::all().add(post::Column::UserId.eq(user_id));
        if !include_drafts {
            condition = condition.add(post::Column::Status.eq(post::PostStatus::Published));
        }
        self.paged(condition, page).await
    }

    /// Case-insensitive substring search over title, content and author username.
    pub async fn search(
        &self,
        query: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        use crate::entities::{User, user};
        use sea_orm::sea_query::Query;

        let pattern = format!(
            "%{}%",
            query
                .to_lowercase()
                .replace('%', "\\%")
                .replace('_', "\\_")
        );

        let authors = Query::select()
            .column(user::Column::Id)
            .from(User)
            .and_where(user::Column::UsernameLower.like(&pattern))
            .to_owned();

        let condition = Condition::all()
            .add(post::Column::Status.eq(post::PostStatus::Published))
            .add(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(post::Column::Title))).like(&pattern))
                    .add(Expr::expr(Func::lower(Expr::col(post::Column::Content))).like(&pattern))
                    .add(post::Column::UserId.in_subquery(authors)),
            );

        self.paged(condition, page).await
    }

    async fn paged(
        &self,
        condition: Condition,
        page: PageRequest,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let total = Post::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let items = Post::find()
            .filter(condition)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    // ==================== Atomic updates ====================

    /// Increment view count atomically (single UPDATE query, no fetch).
    pub async fn increment_view_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the publication state without touching the edit markers.
    ///
    /// Publishing stamps `first_publish_date` only if it was never set.
    pub async fn set_status(
        &self,
        post_id: &str,
        status: post::PostStatus,
    ) -> AppResult<Option<post::Model>> {
        self.apply_changes(
            post_id,
            &PostChanges {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Apply author edits in one statement.
    ///
    /// Content changes mark the post edited iff it had been published before
    /// this statement ran; `first_publish_date` in the `SET` list refers to the
    /// pre-update row.
    pub async fn apply_changes(
        &self,
        post_id: &str,
        changes: &PostChanges,
    ) -> AppResult<Option<post::Model>> {
        let mut values: Vec<Value> = vec![post_id.into()];
        let mut sets: Vec<String> = Vec::new();

        let mut bind = |value: Value| {
            values.push(value);
            format!("${}", values.len())
        };

        if let Some(title) = &changes.title {
            sets.push(format!(r#""title" = {}"#, bind(title.clone().into())));
        }
        if let Some(content) = &changes.content {
            sets.push(format!(r#""content" = {}"#, bind(content.clone().into())));
        }
        if let Some(tags) = &changes.tags {
            sets.push(format!(
                r#""tags" = {}::jsonb"#,
                bind(serde_json::json!(tags).into())
            ));
        }
        if let Some(status) = changes.status {
            let status_value = match status {
                post::PostStatus::Draft => "draft",
                post::PostStatus::Published => "published",
            };
            sets.push(format!(r#""status" = {}"#, bind(status_value.into())));
            if status == post::PostStatus::Published {
                sets.push(
                    r#""first_publish_date" = COALESCE("first_publish_date", CURRENT_TIMESTAMP)"#
                        .to_string(),
                );
            }
        }
        if changes.touches_content() {
            sets.push(r#""is_edited" = "is_edited" OR "first_publish_date" IS NOT NULL"#.to_string());
            sets.push(
                r#""edited_at" = CASE WHEN "first_publish_date" IS NOT NULL
                    THEN CURRENT_TIMESTAMP ELSE "edited_at" END"#
                    .to_string(),
            );
        }
        sets.push(r#""updated_at" = CURRENT_TIMESTAMP"#.to_string());

        let sql = format!(
            r#"UPDATE "post" SET {} WHERE "id" = $1 RETURNING *"#,
            sets.join(", ")
        );

        self.returning(sql, values).await
    }

    /// Toggle `user_id` in the post's like set and recompute `like_count`.
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> AppResult<Option<post::Model>> {
        let likes = toggled(r#""likes""#, "$2::text");
        let sql = format!(
            r#"UPDATE "post"
            SET "likes" = {likes},
                "like_count" = jsonb_array_length({likes})
            WHERE "id" = $1
            RETURNING *"#
        );

        self.returning(sql, vec![post_id.into(), user_id.into()])
            .await
    }

    /// Append a comment to a published post and recompute `comment_count`.
    ///
    /// Returns `None` when the post is missing or not published.
    pub async fn push_comment(
        &self,
        post_id: &str,
        comment: &post::Comment,
    ) -> AppResult<Option<post::Model>> {
        let element = serde_json::to_value([comment])
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let sql = r#"UPDATE "post"
            SET "comments" = "comments" || $2::jsonb,
                "comment_count" = jsonb_array_length("comments" || $2::jsonb)
            WHERE "id" = $1 AND "status" = 'published'
            RETURNING *"#;

        self.returning(sql.to_string(), vec![post_id.into(), element.into()])
            .await
    }

    /// Remove a comment and recompute `comment_count`.
    ///
    /// Returns `None` when the post or the comment is missing.
    pub async fn remove_comment(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<post::Model>> {
        let remaining = r#"COALESCE((
                SELECT jsonb_agg(elem ORDER BY ord)
                FROM jsonb_array_elements("comments") WITH ORDINALITY AS t(elem, ord)
                WHERE elem->>'id' <> $2::text
            ), '[]'::jsonb)"#;

        let sql = format!(
            r#"UPDATE "post"
            SET "comments" = {remaining},
                "comment_count" = jsonb_array_length({remaining})
            WHERE "id" = $1
              AND "comments" @> jsonb_build_array(jsonb_build_object('id', $2::text))
            RETURNING *"#
        );

        self.returning(sql, vec![post_id.into(), comment_id.into()])
            .await
    }

    /// Replace a comment's text. Mentions are left as they were.
    pub async fn update_comment_text(
        &self,
        post_id: &str,
        comment_id: &str,
        text: &str,
        updated_at: &str,
    ) -> AppResult<Option<post::Model>> {
        let sql = r#"UPDATE "post"
            SET "comments" = (
                SELECT jsonb_agg(
                    CASE WHEN elem->>'id' = $2::text
                        THEN elem || jsonb_build_object('text', $3::text, 'updatedAt', $4::text)
                        ELSE elem
                    END ORDER BY ord)
                FROM jsonb_array_elements("comments") WITH ORDINALITY AS t(elem, ord)
            )
            WHERE "id" = $1
              AND "comments" @> jsonb_build_array(jsonb_build_object('id', $2::text))
            RETURNING *"#;

        self.returning(
            sql.to_string(),
            vec![
                post_id.into(),
                comment_id.into(),
                text.into(),
                updated_at.into(),
            ],
        )
        .await
    }

    /// Toggle `user_id` in one comment's like set and recompute its `likeCount`.
    pub async fn toggle_comment_like(
        &self,
        post_id: &str,
        comment_id: &str,
        user_id: &str,
    ) -> AppResult<Option<post::Model>> {
        let likes = toggled("COALESCE(elem->'likes', '[]'::jsonb)", "$3::text");
        let sql = format!(
            r#"UPDATE "post"
            SET "comments" = (
                SELECT jsonb_agg(
                    CASE WHEN elem->>'id' = $2::text
                        THEN elem || jsonb_build_object(
                            'likes', {likes},
                            'likeCount', jsonb_array_length({likes}))
                        ELSE elem
                    END ORDER BY ord)
                FROM jsonb_array_elements("comments") WITH ORDINALITY AS t(elem, ord)
            )
            WHERE "id" = $1
              AND "comments" @> jsonb_build_array(jsonb_build_object('id', $2::text))
            RETURNING *"#
        );

        self.returning(sql, vec![post_id.into(), comment_id.into(), user_id.into()])
            .await
    }

    async fn returning(&self, sql: String, values: Vec<Value>) -> AppResult<Option<post::Model>> {
        Post::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                values,
            ))
            .one(self.db.as_ref())
            .await
            .map_err(|e: DbErr| AppError::Database(e.to_string()))
    }
}
