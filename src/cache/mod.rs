//! Quire cache layer.
//!
//! A single primitive, [`BoundedCache`], backs every memoized lookup. It is a
//! mutex-guarded LRU map: access order, not insertion order, decides which
//! entry is evicted once the configured capacity is reached.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! articles_by_author_capacity = 10
//! ```

mod bounded;
mod config;
mod keys;

pub use bounded::{BoundedCache, CacheError};
pub use config::{CacheConfig, DEFAULT_ARTICLES_BY_AUTHOR_CAPACITY};
pub use keys::CacheKey;
