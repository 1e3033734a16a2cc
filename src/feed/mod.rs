//! The activity pipeline: adapters are merged newest-first, then each
//! revision is rendered into a description.

mod merge;
pub mod render;
mod service;

pub use merge::merge;
pub use render::render;
pub use service::{parse_user_id, ActivityError, ActivityResult, ActivityService, FeedReport};
