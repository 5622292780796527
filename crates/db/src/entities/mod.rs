//! Database entities.

#![allow(missing_docs)]

pub mod notification;
pub mod post;
pub mod report;
pub mod user;

pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use report::Entity as Report;
pub use user::Entity as User;
