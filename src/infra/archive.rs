//! TOML-backed article archive serving the author lookup.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    application::repos::{ArticlesRepo, RepoError},
    domain::entities::{ArticleRecord, AuthorRecord},
};

use super::error::InfraError;

const SOURCE: &str = "infra::archive";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArchive {
    #[serde(default)]
    authors: Vec<AuthorEntry>,
    #[serde(default)]
    articles: Vec<ArticleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuthorEntry {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArticleEntry {
    id: i64,
    author_id: i64,
    title: String,
    #[serde(default)]
    content: String,
}

/// In-memory article set loaded from a TOML file.
///
/// ```toml
/// [[authors]]
/// id = 1
/// name = "Ada"
///
/// [[articles]]
/// id = 10
/// author_id = 1
/// title = "Notes"
/// content = "..."
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArticleArchive {
    by_author: HashMap<String, Vec<ArticleRecord>>,
    article_count: usize,
}

impl ArticleArchive {
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let data = fs::read_to_string(path).map_err(InfraError::Io)?;
        let archive = Self::from_toml_str(path, &data)?;
        info!(
            target = SOURCE,
            path = %path.display(),
            authors = archive.by_author.len(),
            articles = archive.article_count,
            "article archive loaded"
        );
        Ok(archive)
    }

    /// Parse archive text; `origin` only labels errors.
    pub fn from_toml_str(origin: impl Into<PathBuf>, data: &str) -> Result<Self, InfraError> {
        let origin = origin.into();
        let file: RawArchive =
            toml::from_str(data).map_err(|err| InfraError::archive(&origin, err.to_string()))?;

        let mut authors = HashMap::new();
        let mut author_names = HashSet::new();
        for author in file.authors {
            if author.name.trim().is_empty() {
                return Err(InfraError::archive(
                    &origin,
                    format!("author {} has a blank name", author.id),
                ));
            }
            if !author_names.insert(author.name.clone()) {
                return Err(InfraError::archive(
                    &origin,
                    format!("author name `{}` appears more than once", author.name),
                ));
            }
            let record = AuthorRecord {
                id: author.id,
                name: author.name,
            };
            if authors.insert(record.id, record).is_some() {
                return Err(InfraError::archive(
                    &origin,
                    format!("author id {} appears more than once", author.id),
                ));
            }
        }

        let mut by_author: HashMap<String, Vec<ArticleRecord>> = HashMap::new();
        let mut article_ids = HashSet::new();
        for article in file.articles {
            if !article_ids.insert(article.id) {
                return Err(InfraError::archive(
                    &origin,
                    format!("article id {} appears more than once", article.id),
                ));
            }
            let author = authors.get(&article.author_id).ok_or_else(|| {
                InfraError::archive(
                    &origin,
                    format!(
                        "article {} references unknown author {}",
                        article.id, article.author_id
                    ),
                )
            })?;
            by_author
                .entry(author.name.clone())
                .or_default()
                .push(ArticleRecord {
                    id: article.id,
                    title: article.title,
                    content: article.content,
                    author: author.clone(),
                });
        }

        Ok(Self {
            by_author,
            article_count: article_ids.len(),
        })
    }

    pub fn article_count(&self) -> usize {
        self.article_count
    }

    /// Articles whose author is named exactly `author_name`.
    pub fn articles_by(&self, author_name: &str) -> Vec<ArticleRecord> {
        self.by_author
            .get(author_name)
            .cloned()
            .unwrap_or_default()
    }
}

/// [`ArticlesRepo`] over an archive file that is read again on every query,
/// so edits to the file are visible on the next cache miss.
#[derive(Debug, Clone)]
pub struct ArchiveRepo {
    path: PathBuf,
}

impl ArchiveRepo {
    /// Validate the archive at `path` once and serve queries from it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, InfraError> {
        let path = path.into();
        ArticleArchive::load(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ArticlesRepo for ArchiveRepo {
    async fn find_articles_by_author_name(
        &self,
        author_name: &str,
    ) -> Result<Vec<ArticleRecord>, RepoError> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| {
                RepoError::from_persistence(format!(
                    "failed to read article archive {}: {err}",
                    self.path.display()
                ))
            })?;
        let archive =
            ArticleArchive::from_toml_str(&self.path, &data).map_err(RepoError::from_persistence)?;

        let articles = archive.articles_by(author_name);
        debug!(
            target = SOURCE,
            path = %self.path.display(),
            author = author_name,
            count = articles.len(),
            "article archive queried"
        );
        Ok(articles)
    }
}
