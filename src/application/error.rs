use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::{
    application::{articles::ArticleError, jobs::LogTaskError},
    cache::CacheError,
    infra::error::InfraError,
};

/// Coarse classification used when an error leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    NotReady,
    ResourceExhausted,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened error chain for structured reporting.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub kind: ErrorKind,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, kind: ErrorKind, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            kind,
            messages,
        }
    }

    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Articles(#[from] ArticleError),
    #[error(transparent)]
    LogTask(#[from] LogTaskError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Cache(CacheError::InvalidArgument(_))
            | AppError::Articles(ArticleError::BlankAuthor)
            | AppError::Articles(ArticleError::Cache(_))
            | AppError::LogTask(LogTaskError::InvalidArgument(_)) => ErrorKind::InvalidArgument,
            AppError::Articles(ArticleError::NotFound { .. })
            | AppError::LogTask(LogTaskError::NotFound(_)) => ErrorKind::NotFound,
            AppError::LogTask(LogTaskError::NotReady { .. })
            | AppError::LogTask(LogTaskError::Timeout(_)) => ErrorKind::NotReady,
            AppError::LogTask(LogTaskError::ResourceExhausted)
            | AppError::LogTask(LogTaskError::ShuttingDown) => ErrorKind::ResourceExhausted,
            AppError::Infra(_)
            | AppError::Articles(ArticleError::Repo(_))
            | AppError::LogTask(LogTaskError::Failed { .. })
            | AppError::Unexpected(_) => ErrorKind::Internal,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self.kind(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::repos::RepoError,
        domain::types::{LogTaskStatus, TaskId},
    };

    #[test]
    fn classifies_caller_errors() {
        assert_eq!(
            AppError::from(LogTaskError::InvalidArgument("bad date".into())).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            AppError::from(ArticleError::BlankAuthor).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            AppError::from(LogTaskError::NotFound(TaskId::from("1"))).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from(LogTaskError::NotReady {
                task_id: TaskId::from("1"),
                status: LogTaskStatus::Processing,
            })
            .kind(),
            ErrorKind::NotReady
        );
        assert_eq!(
            AppError::from(LogTaskError::ResourceExhausted).kind(),
            ErrorKind::ResourceExhausted
        );
    }

    #[test]
    fn infrastructure_failures_are_internal() {
        let err = AppError::from(InfraError::configuration("missing archive"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.kind().as_str(), "internal");

        let repo = AppError::from(ArticleError::from(RepoError::from_persistence("gone")));
        assert_eq!(repo.kind(), ErrorKind::Internal);
    }

    #[test]
    fn report_walks_the_source_chain() {
        let io = std::io::Error::other("disk gone");
        let err = AppError::from(InfraError::from(io));
        let report = err.report();

        assert_eq!(report.kind, ErrorKind::Internal);
        assert_eq!(report.messages.first().map(String::as_str), Some("io error: disk gone"));
        assert!(report.chain().contains("disk gone"));
    }
}
