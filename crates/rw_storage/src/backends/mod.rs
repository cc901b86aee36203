pub mod json;
pub mod memory;

pub use json::{JsonArticleRegistry, JsonSeenStore};
pub use memory::{MemoryArticleRegistry, MemorySeenStore};
