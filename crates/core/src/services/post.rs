//! Post service.

use std::collections::HashMap;

use agora_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use agora_db::{
    entities::post::{self, PostStatus},
    repositories::{PostChanges, PostRepository, UserRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::gate;
use super::moderation::{self, ModeratedResource, ModerationAction, ModerationService};
use super::slug::SlugAllocator;
use super::user::UserSummary;
use crate::{Actor, sanitize};

/// Maximum number of tags per post.
pub const MAX_TAGS: usize = 20;
/// Maximum characters per tag.
pub const MAX_TAG_LENGTH: usize = 30;

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults to published.
    #[serde(default, rename = "statu", alias = "status")]
    pub status: Option<PostStatus>,
}

/// Input for updating a post. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(default, rename = "statu", alias = "status")]
    pub status: Option<PostStatus>,
}

impl UpdatePostInput {
    fn is_unpublish_only(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.status == Some(PostStatus::Draft)
    }
}

/// Sanitized text fields, checked after cleaning.
#[derive(Debug, Validate)]
struct PostFields {
    #[validate(length(min = 1, max = 40, message = "Title must be between 1 and 40 characters"))]
    title: Option<String>,

    #[validate(length(
        min = 200,
        max = 80000,
        message = "Content must be between 200 and 80000 characters"
    ))]
    content: Option<String>,
}

impl PostFields {
    fn clean(title: Option<&str>, content: Option<&str>) -> AppResult<Self> {
        let fields = Self {
            title: title.map(sanitize::plain_text),
            content: content.map(|c| sanitize::rich_text(c).trim().to_string()),
        };
        fields.validate()?;
        Ok(fields)
    }
}

/// Sanitize, lower-case and de-duplicate tags, dropping empty ones.
pub fn normalize_tags(raw: &[String]) -> AppResult<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = sanitize::plain_text(tag).to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(AppError::Validation(format!(
                "Tags must be at most {MAX_TAG_LENGTH} characters"
            )));
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "At most {MAX_TAGS} tags are allowed"
        )));
    }
    Ok(tags)
}

/// Comment projection with author display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub author: Option<UserSummary>,
    pub mentions: Vec<String>,
    pub likes: Vec<String>,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post projection with author display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub author: Option<UserSummary>,
    #[serde(rename = "statu")]
    pub status: PostStatus,
    pub first_publish_date: Option<DateTime<FixedOffset>>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<FixedOffset>>,
    pub view_count: i32,
    pub likes: Vec<String>,
    pub like_count: i32,
    pub comments: Vec<CommentView>,
    pub comment_count: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

/// Result of toggling a bookmark.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedOutcome {
    pub saved: bool,
    pub saved_posts: Vec<String>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    slugs: SlugAllocator,
    moderation: ModerationService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        moderation: ModerationService,
    ) -> Self {
        Self {
            slugs: SlugAllocator::new(post_repo.clone()),
            post_repo,
            user_repo,
            moderation,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post authored by the actor.
    pub async fn create(&self, actor: &Actor, input: CreatePostInput) -> AppResult<post::Model> {
        let fields = PostFields::clean(Some(&input.title), Some(&input.content))?;
        let tags = normalize_tags(&input.tags)?;
        let (Some(title), Some(content)) = (fields.title, fields.content) else {
            return Err(AppError::Validation("Title and content are required".to_string()));
        };

        let slug = self.slugs.allocate(&title).await?;
        let status = input.status.unwrap_or(PostStatus::Published);
        let now = Utc::now();

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            slug: Set(slug),
            title: Set(title),
            content: Set(content),
            tags: Set(json!(tags)),
            user_id: Set(actor.id.clone()),
            status: Set(status),
            first_publish_date: Set((status == PostStatus::Published).then(|| now.into())),
            is_edited: Set(false),
            edited_at: Set(None),
            view_count: Set(0),
            likes: Set(json!([])),
            like_count: Set(0),
            comments: Set(json!([])),
            comment_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let created = self.post_repo.create(model).await?;
        tracing::info!(post_id = %created.id, slug = %created.slug, status = ?created.status, "Post created");
        Ok(created)
    }

    /// Fetch a post by ID or slug. Non-author reads bump the view count.
    pub async fn get(&self, viewer: Option<&Actor>, key: &str) -> AppResult<post::Model> {
        let mut post = self.post_repo.get_by_id_or_slug(key).await?;
        gate::check_visible(&post, viewer)?;

        if !viewer.is_some_and(|v| v.is(&post.user_id)) {
            match self.post_repo.increment_view_count(&post.id).await {
                Ok(()) => post.view_count += 1,
                Err(e) => tracing::warn!(error = %e, post_id = %post.id, "Failed to count view"),
            }
        }

        Ok(post)
    }

    /// Published posts, newest first.
    pub async fn list(&self, page: PageRequest) -> AppResult<Page<post::Model>> {
        let (items, total) = self.post_repo.find_published(page).await?;
        Ok(Page::new(items, page, total))
    }

    /// Published posts whose title, content or author username contains `query`.
    pub async fn search(&self, query: &str, page: PageRequest) -> AppResult<Page<post::Model>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Search query is required".to_string()));
        }
        let (items, total) = self.post_repo.search(query, page).await?;
        Ok(Page::new(items, page, total))
    }

    /// Posts by one author. Drafts are included for the author and admins.
    pub async fn list_by_user(
        &self,
        viewer: Option<&Actor>,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Page<post::Model>> {
        let author = self.user_repo.get_by_id(user_id).await?;
        let include_drafts = viewer.is_some_and(|v| v.is(&author.id) || v.is_admin());

        let (items, total) = self
            .post_repo
            .find_by_user(&author.id, include_drafts, page)
            .await?;
        Ok(Page::new(items, page, total))
    }

    /// Edit a post. Authors may change anything; an admin may only unpublish.
    pub async fn update(
        &self,
        actor: &Actor,
        post_id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if !actor.is(&post.user_id) {
            if actor.is_admin() && input.is_unpublish_only() {
                if post.status == PostStatus::Draft {
                    return Ok(post);
                }
                return self.unpublish(actor, post_id, None).await;
            }
            return Err(AppError::Forbidden(
                "only the author may edit this post".to_string(),
            ));
        }

        let fields = PostFields::clean(input.title.as_deref(), input.content.as_deref())?;
        let tags = input.tags.as_deref().map(normalize_tags).transpose()?;

        let changes = PostChanges {
            title: fields.title.filter(|t| *t != post.title),
            content: fields.content.filter(|c| *c != post.content),
            tags: tags.filter(|t| *t != post.tag_list()),
            status: input.status.filter(|s| *s != post.status),
        };
        if changes.is_empty() {
            return Ok(post);
        }

        let updated = self
            .post_repo
            .apply_changes(post_id, &changes)
            .await?
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;

        tracing::info!(
            post_id = %post_id,
            status = ?updated.status,
            is_edited = updated.is_edited,
            "Post updated"
        );
        Ok(updated)
    }

    /// Move a post back to draft. The author or an admin may do this.
    pub async fn unpublish(
        &self,
        actor: &Actor,
        post_id: &str,
        reason: Option<String>,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let authority = moderation::authorize(actor, &post.user_id, &[])?;

        let updated = self
            .post_repo
            .set_status(post_id, PostStatus::Draft)
            .await?
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;

        tracing::info!(post_id = %post_id, actor_id = %actor.id, "Post unpublished");

        self.moderation
            .record(
                actor,
                authority,
                ModerationAction::Unpublish,
                ModeratedResource {
                    author_id: post.user_id,
                    post_id: post_id.to_string(),
                    comment_id: None,
                },
                reason,
            )
            .await;

        Ok(updated)
    }

    /// Delete a post with its comments and likes. The author or an admin may do this.
    ///
    /// Notifications that point at the post are left to expire.
    pub async fn delete(
        &self,
        actor: &Actor,
        post_id: &str,
        reason: Option<String>,
    ) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let authority = moderation::authorize(actor, &post.user_id, &[])?;

        if !self.post_repo.delete(post_id).await? {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }

        tracing::info!(post_id = %post_id, actor_id = %actor.id, "Post deleted");

        if let Err(e) = self.user_repo.forget_post(post_id).await {
            tracing::warn!(error = %e, post_id = %post_id, "Failed to clear deleted post from user sets");
        }

        self.moderation
            .record(
                actor,
                authority,
                ModerationAction::Delete,
                ModeratedResource {
                    author_id: post.user_id,
                    post_id: post_id.to_string(),
                    comment_id: None,
                },
                reason,
            )
            .await;

        Ok(())
    }

    /// Bookmark a visible post, or drop the bookmark.
    pub async fn toggle_saved(&self, actor: &Actor, post_id: &str) -> AppResult<SavedOutcome> {
        let post = self.post_repo.get_by_id(post_id).await?;
        gate::check_visible(&post, Some(actor))?;

        let user = self
            .user_repo
            .toggle_saved_post(&actor.id, &post.id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(actor.id.clone()))?;

        let saved_posts = user.saved_post_ids();
        Ok(SavedOutcome {
            saved: saved_posts.contains(&post.id),
            saved_posts,
        })
    }

    /// Project posts with author display fields for posts and comments.
    pub async fn present(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostView>> {
        let mut decoded = Vec::with_capacity(posts.len());
        let mut user_ids: Vec<String> = Vec::new();
        for post in posts {
            let comments = post
                .comment_list()
                .map_err(|e| AppError::Internal(format!("corrupt comments on post {}: {e}", post.id)))?;
            user_ids.push(post.user_id.clone());
            user_ids.extend(comments.iter().map(|c| c.user_id.clone()));
            decoded.push((post, comments));
        }
        user_ids.sort();
        user_ids.dedup();

        let users: HashMap<String, UserSummary> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();

        Ok(decoded
            .into_iter()
            .map(|(post, comments)| PostView {
                author: users.get(&post.user_id).cloned(),
                tags: post.tag_list(),
                likes: post.like_ids(),
                comments: comments
                    .into_iter()
                    .map(|c| CommentView {
                        author: users.get(&c.user_id).cloned(),
                        id: c.id,
                        text: c.text,
                        mentions: c.mentions,
                        likes: c.likes,
                        like_count: c.like_count,
                        created_at: c.created_at,
                        updated_at: c.updated_at,
                    })
                    .collect(),
                id: post.id,
                slug: post.slug,
                title: post.title,
                content: post.content,
                status: post.status,
                first_publish_date: post.first_publish_date,
                is_edited: post.is_edited,
                edited_at: post.edited_at,
                view_count: post.view_count,
                like_count: post.like_count,
                comment_count: post.comment_count,
                created_at: post.created_at,
                updated_at: post.updated_at,
            })
            .collect())
    }

    /// Project a single post.
    pub async fn present_one(&self, post: post::Model) -> AppResult<PostView> {
        self.present(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("post projection lost".to_string()))
    }
}
