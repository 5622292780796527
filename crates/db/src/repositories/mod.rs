//! Database repositories.

mod notification;
mod post;
mod report;
mod user;

pub use notification::NotificationRepository;
pub use post::{PostChanges, PostRepository};
pub use report::ReportRepository;
pub use user::UserRepository;
