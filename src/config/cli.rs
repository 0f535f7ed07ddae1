use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the quire binary.
#[derive(Debug, Parser)]
#[command(
    name = "quire",
    version,
    about = "Cached article lookups and date-filtered log exports"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "QUIRE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Extract every log line for one day into a downloadable artifact.
    #[command(name = "export-logs")]
    ExportLogs(ExportLogsArgs),
    /// List an author's articles through the bounded cache.
    #[command(name = "articles-by-author")]
    ArticlesByAuthor(ArticlesByAuthorArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportLogsArgs {
    /// Day to export, formatted as YYYY-MM-DD.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: String,

    #[command(flatten)]
    pub overrides: ExportLogsOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ExportLogsOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the log file read by export jobs.
    #[arg(long = "log-source", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_source: Option<PathBuf>,

    /// Override the directory receiving exported artifacts.
    #[arg(long = "artifact-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub artifact_dir: Option<PathBuf>,

    /// Override how long to wait for the export to finish.
    #[arg(long = "wait-seconds", value_name = "SECONDS")]
    pub wait_seconds: Option<u64>,

    /// Override the number of export workers.
    #[arg(long = "jobs-log-export-workers", value_name = "COUNT")]
    pub log_export_workers: Option<i64>,

    /// Override the export queue capacity.
    #[arg(long = "jobs-log-export-queue-capacity", value_name = "COUNT")]
    pub log_export_queue_capacity: Option<i64>,
}

#[derive(Debug, Args, Clone)]
pub struct ArticlesByAuthorArgs {
    /// Exact author name to look up.
    #[arg(long, value_name = "NAME")]
    pub author: String,

    /// Run the lookup this many times; repeats are served from the cache.
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub repeat: u32,

    #[command(flatten)]
    pub overrides: ArticlesOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ArticlesOverrides {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the TOML article archive.
    #[arg(long = "archive", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub archive: Option<PathBuf>,

    /// Override the author cache capacity.
    #[arg(long = "cache-articles-by-author-capacity", value_name = "COUNT")]
    pub articles_by_author_capacity: Option<i64>,
}
