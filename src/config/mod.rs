//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{
    ArticlesByAuthorArgs, ArticlesOverrides, CliArgs, Command, ExportLogsArgs,
    ExportLogsOverrides, LoggingOverrides,
};

use crate::{
    application::jobs::{
        DEFAULT_LOG_EXPORT_QUEUE_CAPACITY, DEFAULT_LOG_EXPORT_WORKERS, LOG_EXPORT_WAIT_TIMEOUT,
    },
    cache::DEFAULT_ARTICLES_BY_AUTHOR_CAPACITY,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "quire";
const ENV_PREFIX: &str = "QUIRE";
const DEFAULT_LOG_SOURCE: &str = "application.log";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub jobs: JobsSettings,
    pub logs: LogsSettings,
    pub articles: ArticlesSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub articles_by_author_capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct JobsSettings {
    pub log_export_workers: NonZeroUsize,
    pub log_export_queue_capacity: NonZeroUsize,
    pub wait_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LogsSettings {
    pub source_path: PathBuf,
    pub artifact_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ArticlesSettings {
    pub archive_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command_overrides(&cli.command);
    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    jobs: RawJobsSettings,
    logs: RawLogsSettings,
    articles: RawArticlesSettings,
}

impl RawSettings {
    fn apply_command_overrides(&mut self, command: &Command) {
        match command {
            Command::ExportLogs(args) => self.apply_export_logs_overrides(&args.overrides),
            Command::ArticlesByAuthor(args) => self.apply_articles_overrides(&args.overrides),
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_export_logs_overrides(&mut self, overrides: &ExportLogsOverrides) {
        self.apply_logging_overrides(&overrides.logging);

        if let Some(path) = overrides.log_source.as_ref() {
            self.logs.source_path = Some(path.clone());
        }
        if let Some(dir) = overrides.artifact_dir.as_ref() {
            self.logs.artifact_dir = Some(dir.clone());
        }
        if let Some(seconds) = overrides.wait_seconds {
            self.jobs.wait_timeout_seconds = Some(seconds);
        }
        if let Some(value) = overrides.log_export_workers {
            self.jobs.log_export_workers = Some(value);
        }
        if let Some(value) = overrides.log_export_queue_capacity {
            self.jobs.log_export_queue_capacity = Some(value);
        }
    }

    fn apply_articles_overrides(&mut self, overrides: &ArticlesOverrides) {
        self.apply_logging_overrides(&overrides.logging);

        if let Some(path) = overrides.archive.as_ref() {
            self.articles.archive_path = Some(path.clone());
        }
        if let Some(value) = overrides.articles_by_author_capacity {
            self.cache.articles_by_author_capacity = Some(value);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            jobs,
            logs,
            articles,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
            jobs: build_jobs_settings(jobs)?,
            logs: build_logs_settings(logs)?,
            articles: build_articles_settings(articles),
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = cache
        .articles_by_author_capacity
        .unwrap_or(DEFAULT_ARTICLES_BY_AUTHOR_CAPACITY as i64);

    Ok(CacheSettings {
        articles_by_author_capacity: non_zero_usize(
            capacity,
            "cache.articles_by_author_capacity",
        )?,
    })
}

fn build_jobs_settings(jobs: RawJobsSettings) -> Result<JobsSettings, LoadError> {
    let workers = jobs
        .log_export_workers
        .unwrap_or(DEFAULT_LOG_EXPORT_WORKERS as i64);
    let queue_capacity = jobs
        .log_export_queue_capacity
        .unwrap_or(DEFAULT_LOG_EXPORT_QUEUE_CAPACITY as i64);
    let wait_seconds = jobs
        .wait_timeout_seconds
        .unwrap_or(LOG_EXPORT_WAIT_TIMEOUT.as_secs());
    if wait_seconds == 0 {
        return Err(LoadError::invalid(
            "jobs.wait_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(JobsSettings {
        log_export_workers: non_zero_usize(workers, "jobs.log_export_workers")?,
        log_export_queue_capacity: non_zero_usize(
            queue_capacity,
            "jobs.log_export_queue_capacity",
        )?,
        wait_timeout: Duration::from_secs(wait_seconds),
    })
}

fn build_logs_settings(logs: RawLogsSettings) -> Result<LogsSettings, LoadError> {
    let source_path = logs
        .source_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_SOURCE));
    if source_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "logs.source_path",
            "path must not be empty",
        ));
    }

    let artifact_dir = logs.artifact_dir.unwrap_or_else(std::env::temp_dir);
    if artifact_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "logs.artifact_dir",
            "path must not be empty",
        ));
    }

    Ok(LogsSettings {
        source_path,
        artifact_dir,
    })
}

fn build_articles_settings(articles: RawArticlesSettings) -> ArticlesSettings {
    let archive_path = articles
        .archive_path
        .filter(|path| !path.as_os_str().is_empty());
    ArticlesSettings { archive_path }
}

fn non_zero_usize(value: i64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    if value <= 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    articles_by_author_capacity: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawJobsSettings {
    log_export_workers: Option<i64>,
    log_export_queue_capacity: Option<i64>,
    wait_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLogsSettings {
    source_path: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawArticlesSettings {
    archive_path: Option<PathBuf>,
}
