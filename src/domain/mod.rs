pub mod activity;
pub mod entity;
pub mod revision;

pub use activity::*;
pub use entity::*;
pub use revision::*;
