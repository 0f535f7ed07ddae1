//! Cache sizing resolved from the `[cache]` settings section.

use serde::Deserialize;

/// Matches the article-by-author cache size the service has always shipped with.
pub const DEFAULT_ARTICLES_BY_AUTHOR_CAPACITY: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of authors whose article lists are memoized.
    pub articles_by_author_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            articles_by_author_capacity: DEFAULT_ARTICLES_BY_AUTHOR_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            articles_by_author_capacity: settings.articles_by_author_capacity.get(),
        }
    }
}
