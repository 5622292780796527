//! Core business logic for agora.
//!
//! The post aggregate rules live here: slug allocation, the publication gate,
//! like toggling, the embedded comment manager, mention extraction,
//! notification fan-out and the moderation workflow layered over ownership.

pub mod actor;
pub mod sanitize;
pub mod services;

pub use actor::Actor;
pub use services::*;
