//! Report service.
//!
//! Anyone signed in may report a post, a comment or a user once. Only admins
//! see and handle reports.

use agora_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use agora_db::{
    entities::report::{self, ReportStatus, ReportTargetType},
    repositories::{PostRepository, ReportRepository, UserRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Actor, sanitize};

/// Input for filing a report.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    #[validate(length(min = 1, message = "Target is required"))]
    pub target: String,

    pub target_type: ReportTargetType,

    /// Parent post, required for comment targets.
    pub target_post: Option<String>,

    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,

    #[validate(length(max = 300, message = "Description must be at most 300 characters"))]
    pub description: Option<String>,
}

/// Report projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub reporter: String,
    pub target: String,
    pub target_type: ReportTargetType,
    pub target_post: Option<String>,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<report::Model> for ReportView {
    fn from(r: report::Model) -> Self {
        Self {
            id: r.id,
            reporter: r.reporter_id,
            target: r.target_id,
            target_type: r.target_type,
            target_post: r.target_post_id,
            reason: r.reason,
            description: r.description,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            report_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a report. A second report of the same target by the same reporter
    /// is a `Conflict`.
    pub async fn create(&self, actor: &Actor, input: CreateReportInput) -> AppResult<report::Model> {
        let input = CreateReportInput {
            target: input.target.trim().to_string(),
            target_post: input
                .target_post
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            reason: sanitize::plain_text(&input.reason),
            description: input
                .description
                .map(|d| sanitize::plain_text(&d))
                .filter(|d| !d.is_empty()),
            ..input
        };
        input.validate()?;

        if self
            .report_repo
            .exists_for(&actor.id, &input.target)
            .await?
        {
            return Err(AppError::Conflict(
                "you have already reported this".to_string(),
            ));
        }

        self.check_target(&input).await?;

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(actor.id.clone()),
            target_id: Set(input.target),
            target_type: Set(input.target_type),
            target_post_id: Set(input.target_post),
            reason: Set(input.reason),
            description: Set(input.description),
            status: Set(ReportStatus::Pending),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.report_repo.create(model).await?;
        tracing::info!(
            report_id = %created.id,
            target_type = ?created.target_type,
            target_id = %created.target_id,
            "Report filed"
        );
        Ok(created)
    }

    async fn check_target(&self, input: &CreateReportInput) -> AppResult<()> {
        match input.target_type {
            ReportTargetType::Post => {
                self.post_repo.get_by_id(&input.target).await?;
            }
            ReportTargetType::User => {
                self.user_repo.get_by_id(&input.target).await?;
            }
            ReportTargetType::Comment => {
                let post_id = input.target_post.as_deref().ok_or_else(|| {
                    AppError::Validation("Target post is required for comment reports".to_string())
                })?;
                let post = self.post_repo.get_by_id(post_id).await?;
                post.find_comment(&input.target)
                    .map_err(|e| AppError::Internal(e.to_string()))?
                    .ok_or_else(|| AppError::CommentNotFound(input.target.clone()))?;
            }
        }
        Ok(())
    }

    /// Reports newest first, optionally by status. Admin only.
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<ReportStatus>,
        page: PageRequest,
    ) -> AppResult<Page<report::Model>> {
        require_admin(actor)?;
        let (items, total) = self.report_repo.find_all(status, page).await?;
        Ok(Page::new(items, page, total))
    }

    /// Resolve or dismiss a report. Admin only.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        status: ReportStatus,
    ) -> AppResult<report::Model> {
        require_admin(actor)?;
        if status == ReportStatus::Pending {
            return Err(AppError::Validation(
                "Status must be resolved or dismissed".to_string(),
            ));
        }

        let report = self.report_repo.get_by_id(id).await?;
        let mut active: report::ActiveModel = report.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.report_repo.update(active).await?;
        tracing::info!(report_id = %id, status = ?status, admin_id = %actor.id, "Report status changed");
        Ok(updated)
    }

    /// Delete a report. Admin only.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AppResult<()> {
        require_admin(actor)?;
        if !self.report_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("report {id}")));
        }
        tracing::info!(report_id = %id, admin_id = %actor.id, "Report deleted");
        Ok(())
    }
}

fn require_admin(actor: &Actor) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin only".to_string()))
    }
}
