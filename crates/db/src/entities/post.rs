//! Post entity.
//!
//! A post is the document of record for its likes and comments. Comments
//! live inside the `comments` JSON array and have no table of their own.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Publication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

/// A comment embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Locally unique within the parent post.
    pub id: String,
    pub text: String,
    pub user_id: String,
    /// User IDs resolved from `@handles` when the comment was written.
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// URL identifier, assigned once
    #[sea_orm(unique)]
    pub slug: String,

    pub title: String,

    /// Sanitized rich text
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Lower-cased tags in author order
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    pub status: PostStatus,

    /// Set on the first transition to published, never cleared
    #[sea_orm(nullable)]
    pub first_publish_date: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = false)]
    pub is_edited: bool,

    #[sea_orm(nullable)]
    pub edited_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = 0)]
    pub view_count: i32,

    /// User IDs that liked this post
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: Json,

    /// Always `likes.len()`
    #[sea_orm(default_value = 0)]
    pub like_count: i32,

    /// Embedded [`Comment`] array
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: Json,

    /// Always `comments.len()`
    #[sea_orm(default_value = 0)]
    pub comment_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether the post is publicly visible.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// User IDs in the like set.
    #[must_use]
    pub fn like_ids(&self) -> Vec<String> {
        serde_json::from_value(self.likes.clone()).unwrap_or_default()
    }

    /// Whether `user_id` is in the like set.
    #[must_use]
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes
            .as_array()
            .is_some_and(|likes| likes.iter().any(|v| v.as_str() == Some(user_id)))
    }

    /// Tags in author order.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }

    /// Decodes the embedded comments.
    pub fn comment_list(&self) -> Result<Vec<Comment>, serde_json::Error> {
        serde_json::from_value(self.comments.clone())
    }

    /// Finds one embedded comment.
    pub fn find_comment(&self, comment_id: &str) -> Result<Option<Comment>, serde_json::Error> {
        Ok(self
            .comment_list()?
            .into_iter()
            .find(|c| c.id == comment_id))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
