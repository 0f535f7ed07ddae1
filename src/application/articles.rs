//! Article queries served through the author cache.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    application::repos::{ArticlesRepo, RepoError},
    cache::{BoundedCache, CacheConfig, CacheError},
    domain::entities::ArticleRecord,
};

const SOURCE: &str = "application::articles";
const AUTHOR_CACHE_NAME: &str = "articles_by_author";

/// Shared, immutable snapshot of one author's articles.
pub type AuthorArticles = Arc<Vec<ArticleRecord>>;

pub type AuthorArticlesCache = BoundedCache<String, AuthorArticles>;

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("author name must not be blank")]
    BlankAuthor,
    #[error("no articles found for author `{author}`")]
    NotFound { author: String },
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ArticleService {
    repo: Arc<dyn ArticlesRepo>,
    by_author: Arc<AuthorArticlesCache>,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticlesRepo>, by_author: Arc<AuthorArticlesCache>) -> Self {
        Self { repo, by_author }
    }

    /// Build the service with a fresh author cache sized from `config`.
    pub fn with_config(
        repo: Arc<dyn ArticlesRepo>,
        config: &CacheConfig,
    ) -> Result<Self, CacheError> {
        let cache =
            BoundedCache::with_name(AUTHOR_CACHE_NAME, config.articles_by_author_capacity)?;
        Ok(Self::new(repo, Arc::new(cache)))
    }

    /// Articles written by `author_name`, served from the cache when possible.
    ///
    /// The repository is consulted only on a miss. An author without articles
    /// is reported as not found and is never cached.
    pub async fn find_by_author_name(
        &self,
        author_name: &str,
    ) -> Result<AuthorArticles, ArticleError> {
        if author_name.trim().is_empty() {
            warn!(target = SOURCE, "rejected blank author name");
            return Err(ArticleError::BlankAuthor);
        }

        if let Some(articles) = self.cache_lookup(author_name) {
            debug!(target = SOURCE, author = author_name, "author articles served from cache");
            return Ok(articles);
        }

        let articles = self
            .repo
            .find_articles_by_author_name(author_name)
            .await?;
        if articles.is_empty() {
            info!(target = SOURCE, author = author_name, "author has no articles");
            return Err(ArticleError::NotFound {
                author: author_name.to_string(),
            });
        }

        let articles = Arc::new(articles);
        self.by_author
            .put(author_name.to_string(), Arc::clone(&articles))?;
        debug!(
            target = SOURCE,
            author = author_name,
            count = articles.len(),
            "author articles cached"
        );

        Ok(articles)
    }

    /// Cached articles for `author_name`, if present.
    pub fn cache_lookup(&self, author_name: &str) -> Option<AuthorArticles> {
        self.by_author.get(author_name)
    }

    /// Store `articles` for `author_name`, replacing any cached list.
    pub fn cache_populate(
        &self,
        author_name: &str,
        articles: Vec<ArticleRecord>,
    ) -> Result<(), CacheError> {
        self.by_author
            .put(author_name.to_string(), Arc::new(articles))
    }

    pub fn cached_authors(&self) -> usize {
        self.by_author.size()
    }
}
