//! HTTP API layer for agora.
//!
//! - **Endpoints**: posts, comments, likes, notifications, reports, users
//! - **Extractors**: required and optional authentication
//! - **Middleware**: bearer-token identity resolution that fails soft
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
