//! API middleware.

#![allow(missing_docs)]

use agora_core::{
    Actor, CommentService, FollowService, LikeService, NotificationService, PostService,
    ReportService, UserService,
};
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub follow_service: FollowService,
    pub notification_service: NotificationService,
    pub report_service: ReportService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to an [`Actor`]. A missing,
/// malformed or unknown token leaves the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(Actor::from(&user));
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token not accepted"),
        }
    }

    next.run(req).await
}
