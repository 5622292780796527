//! API endpoints.

mod comments;
mod notifications;
mod posts;
mod reports;
mod users;

use agora_common::{AppResult, Page, PageRequest};
use agora_core::PostView;
use agora_db::entities::post;
use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;
use crate::response::Paginated;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router().merge(comments::router()))
        .nest("/notifications", notifications::router())
        .nest("/reports", reports::router())
        .nest("/users", users::router())
}

/// `?page=&limit=` query.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// `?reason=` query carried by moderation actions.
#[derive(Debug, Default, Deserialize)]
pub struct ReasonQuery {
    pub reason: Option<String>,
}

/// Project a page of posts.
async fn present_posts(
    state: &AppState,
    page: Page<post::Model>,
) -> AppResult<Paginated<PostView>> {
    let views = state.post_service.present(page.items).await?;
    Ok(Paginated::from_page(Page {
        items: views,
        info: page.info,
    }))
}
