//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::ArticleRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Read access to articles, queried by the author-name lookup on a cache miss.
#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    /// All articles whose author carries exactly `author_name`.
    async fn find_articles_by_author_name(
        &self,
        author_name: &str,
    ) -> Result<Vec<ArticleRecord>, RepoError>;
}
