//! Notifications endpoints.

use agora_common::AppResult;
use agora_core::NotificationView;
use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::Serialize;

use super::PageQuery;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Paginated},
};

/// Unread count response.
#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Mark-all-read response.
#[derive(Serialize)]
pub struct MarkAllAsReadResponse {
    pub updated: u64,
}

/// Mark-read response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadResponse {
    pub id: String,
    pub is_read: bool,
}

/// GET /notifications - Unexpired notifications, newest first.
async fn list_notifications(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Paginated<NotificationView>> {
    let page = state
        .notification_service
        .list(&actor, query.request())
        .await?;
    Ok(Paginated::from_page(page))
}

/// GET /notifications/unread-count - Count unread notifications.
async fn unread_count(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.notification_service.count_unread(&actor).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

/// PUT /notifications/{id}/read - Mark one notification read.
async fn mark_as_read(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MarkAsReadResponse>> {
    let notification = state.notification_service.mark_read(&actor, &id).await?;
    Ok(ApiResponse::ok(MarkAsReadResponse {
        id: notification.id,
        is_read: notification.is_read,
    }))
}

/// PUT /notifications/mark-all-read - Mark all notifications read.
async fn mark_all_as_read(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllAsReadResponse>> {
    let updated = state.notification_service.mark_all_read(&actor).await?;
    Ok(ApiResponse::ok(MarkAllAsReadResponse { updated }))
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/mark-all-read", put(mark_all_as_read))
        .route("/{id}/read", put(mark_as_read))
}
