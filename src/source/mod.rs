mod memory;
mod traits;

pub use memory::{MemoryHistoryStore, RevisionLogSource};
pub use traits::*;
