//! Post endpoints.

use agora_common::AppResult;
use agora_core::{
    CreatePostInput, LikeOutcome, LikeTarget, PostView, SavedOutcome, UpdatePostInput,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;

use super::{PageQuery, ReasonQuery, present_posts};
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Paginated, no_content},
};

/// `?q=&page=&limit=` query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /posts - Published posts, newest first.
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Paginated<PostView>> {
    let page = state.post_service.list(query.request()).await?;
    present_posts(&state, page).await
}

/// GET /posts/search - Substring search over title, content and author.
async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Paginated<PostView>> {
    let request = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .request();
    let page = state.post_service.search(&query.q, request).await?;
    present_posts(&state, page).await
}

/// POST /posts - Create a post.
async fn create_post(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<(StatusCode, ApiResponse<PostView>)> {
    let post = state.post_service.create(&actor, input).await?;
    let view = state.post_service.present_one(post).await?;
    Ok(ApiResponse::created(view))
}

/// GET /posts/{id} - Get a post by ID or slug.
async fn get_post(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<ApiResponse<PostView>> {
    let post = state.post_service.get(viewer.as_ref(), &key).await?;
    Ok(ApiResponse::ok(state.post_service.present_one(post).await?))
}

/// PUT /posts/{id} - Edit a post.
async fn update_post(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostView>> {
    let post = state.post_service.update(&actor, &id, input).await?;
    Ok(ApiResponse::ok(state.post_service.present_one(post).await?))
}

/// DELETE /posts/{id} - Delete a post.
async fn delete_post(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReasonQuery>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(&actor, &id, query.reason).await?;
    Ok(no_content())
}

/// POST /posts/{id}/unpublish - Move a post back to draft.
async fn unpublish_post(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReasonQuery>,
) -> AppResult<ApiResponse<PostView>> {
    let post = state
        .post_service
        .unpublish(&actor, &id, query.reason)
        .await?;
    Ok(ApiResponse::ok(state.post_service.present_one(post).await?))
}

/// PUT /posts/{id}/like - Toggle a post like.
async fn toggle_like(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeOutcome>> {
    let outcome = state
        .like_service
        .toggle(&actor, LikeTarget::Post { post_id: id })
        .await?;
    Ok(ApiResponse::ok(outcome))
}

/// PUT /posts/{id}/save - Toggle a bookmark.
async fn toggle_save(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SavedOutcome>> {
    let outcome = state.post_service.toggle_saved(&actor, &id).await?;
    Ok(ApiResponse::ok(outcome))
}

/// Create the posts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/search", get(search_posts))
        .route(
            "/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/{id}/unpublish", post(unpublish_post))
        .route("/{id}/like", put(toggle_like))
        .route("/{id}/save", put(toggle_save))
}
