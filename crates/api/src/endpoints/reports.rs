//! Report endpoints.

use agora_common::{AppResult, Page};
use agora_core::{CreateReportInput, ReportView};
use agora_db::entities::report::ReportStatus;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Paginated, no_content},
};

/// `?status=&page=&limit=` query.
#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    pub status: ReportStatus,
}

/// POST /reports - File a report.
async fn create_report(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> AppResult<(StatusCode, ApiResponse<ReportView>)> {
    let report = state.report_service.create(&actor, input).await?;
    Ok(ApiResponse::created(report.into()))
}

/// GET /reports - List reports (admin).
async fn list_reports(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> AppResult<Paginated<ReportView>> {
    let request = super::PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .request();
    let page: Page<ReportView> = state
        .report_service
        .list(&actor, query.status, request)
        .await?
        .map(Into::into);
    Ok(Paginated::from_page(page))
}

/// PUT /reports/{id} - Resolve or dismiss a report (admin).
async fn update_report(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateReportRequest>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state
        .report_service
        .update_status(&actor, &id, req.status)
        .await?;
    Ok(ApiResponse::ok(report.into()))
}

/// DELETE /reports/{id} - Delete a report (admin).
async fn delete_report(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.report_service.delete(&actor, &id).await?;
    Ok(no_content())
}

/// Create the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(create_report))
        .route("/{id}", put(update_report).delete(delete_report))
}
