//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod gate;
pub mod like;
pub mod mention;
pub mod moderation;
pub mod notification;
pub mod post;
pub mod report;
pub mod slug;
pub mod user;

pub use comment::{CommentInput, CommentService};
pub use follow::{FollowOutcome, FollowService};
pub use like::{LikeOutcome, LikeService, LikeTarget};
pub use mention::{MentionResolver, extract_handles};
pub use moderation::{Authority, ModeratedResource, ModerationAction, ModerationService};
pub use notification::{NotificationEvent, NotificationService, NotificationView, PostSummary};
pub use post::{
    CommentView, CreatePostInput, PostService, PostView, SavedOutcome, UpdatePostInput,
};
pub use report::{CreateReportInput, ReportService, ReportView};
pub use slug::{SlugAllocator, slugify};
pub use user::{UpdateProfileInput, UserProfile, UserService, UserSummary};
