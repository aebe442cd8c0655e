//! Response cache keyed by upstream request identity
//!
//! - [`CacheStore`] - async seam for the store; [`MemoryCacheStore`] is the
//!   in-process TTL implementation
//! - [`BackgroundWrites`] - supervisor that lets cache population run detached
//!   from the response path

mod background;
mod store;

pub use background::BackgroundWrites;
pub use store::{CacheKey, CacheStore, MemoryCacheStore};
