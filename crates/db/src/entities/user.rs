//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Lower-cased handle used for mention resolution
    #[sea_orm(unique)]
    pub username_lower: String,

    /// Display name
    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    /// Short profile text
    #[sea_orm(nullable)]
    pub bio: Option<String>,

    /// Avatar URL handed back by the upload service
    #[sea_orm(nullable)]
    pub profile_picture: Option<String>,

    pub role: UserRole,

    /// Bearer token issued by the auth service
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Post IDs this user has liked
    #[sea_orm(column_type = "JsonBinary")]
    pub liked_posts: Json,

    /// Post IDs this user has bookmarked
    #[sea_orm(column_type = "JsonBinary")]
    pub saved_posts: Json,

    /// IDs of the users following this user
    #[sea_orm(column_type = "JsonBinary")]
    pub followers: Json,

    /// IDs of the users this user follows
    #[sea_orm(column_type = "JsonBinary")]
    pub following: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this account holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// IDs of the posts this user has liked.
    #[must_use]
    pub fn liked_post_ids(&self) -> Vec<String> {
        serde_json::from_value(self.liked_posts.clone()).unwrap_or_default()
    }

    /// IDs of the posts this user has saved.
    #[must_use]
    pub fn saved_post_ids(&self) -> Vec<String> {
        serde_json::from_value(self.saved_posts.clone()).unwrap_or_default()
    }

    /// IDs of the users following this user.
    #[must_use]
    pub fn follower_ids(&self) -> Vec<String> {
        serde_json::from_value(self.followers.clone()).unwrap_or_default()
    }

    /// IDs of the users this user follows.
    #[must_use]
    pub fn following_ids(&self) -> Vec<String> {
        serde_json::from_value(self.following.clone()).unwrap_or_default()
    }

    /// Whether this user follows `user_id`.
    #[must_use]
    pub fn follows(&self, user_id: &str) -> bool {
        self.following_ids().iter().any(|id| id == user_id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
