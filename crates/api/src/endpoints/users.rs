//! User endpoints.

use agora_common::AppResult;
use agora_core::{FollowOutcome, PostView, UpdateProfileInput, UserProfile};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};

use super::{PageQuery, present_posts};
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Paginated},
};

/// GET /users/{id} - Public profile.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserProfile>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// PUT /users/{id} - Update one's own profile.
async fn update_user(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserProfile>> {
    let user = state
        .user_service
        .update_profile(&actor, &id, input)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// GET /users/{id}/posts - Posts by a user; drafts for the owner and admins.
async fn user_posts(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Paginated<PostView>> {
    let page = state
        .post_service
        .list_by_user(viewer.as_ref(), &id, query.request())
        .await?;
    present_posts(&state, page).await
}

/// PUT /users/{id}/follow - Follow or unfollow a user.
async fn toggle_follow(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FollowOutcome>> {
    let outcome = state.follow_service.toggle(&actor, &id).await?;
    Ok(ApiResponse::ok(outcome))
}

/// Create the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_user).put(update_user))
        .route("/{id}/posts", get(user_posts))
        .route("/{id}/follow", put(toggle_follow))
}
