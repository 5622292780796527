//! Comment endpoints, nested under a post.

use agora_common::AppResult;
use agora_core::{CommentInput, LikeOutcome, LikeTarget, PostView};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{post, put},
};

use super::ReasonQuery;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// POST /posts/{id}/comments - Add a comment.
async fn add_comment(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<(StatusCode, ApiResponse<PostView>)> {
    let post = state.comment_service.add(&actor, &post_id, &input).await?;
    let view = state.post_service.present_one(post).await?;
    Ok(ApiResponse::created(view))
}

/// PUT /posts/{id}/comments/{comment_id} - Edit a comment.
async fn edit_comment(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<PostView>> {
    let post = state
        .comment_service
        .edit(&actor, &post_id, &comment_id, &input)
        .await?;
    Ok(ApiResponse::ok(state.post_service.present_one(post).await?))
}

/// DELETE /posts/{id}/comments/{comment_id} - Delete a comment.
async fn delete_comment(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
    Query(query): Query<ReasonQuery>,
) -> AppResult<ApiResponse<PostView>> {
    let post = state
        .comment_service
        .delete(&actor, &post_id, &comment_id, query.reason)
        .await?;
    Ok(ApiResponse::ok(state.post_service.present_one(post).await?))
}

/// PUT /posts/{id}/comments/{comment_id}/like - Toggle a comment like.
async fn toggle_comment_like(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<LikeOutcome>> {
    let outcome = state
        .like_service
        .toggle(
            &actor,
            LikeTarget::Comment {
                post_id,
                comment_id,
            },
        )
        .await?;
    Ok(ApiResponse::ok(outcome))
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/comments", post(add_comment))
        .route(
            "/{id}/comments/{comment_id}",
            put(edit_comment).delete(delete_comment),
        )
        .route("/{id}/comments/{comment_id}/like", put(toggle_comment_like))
}
