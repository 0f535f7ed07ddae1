use std::{process, sync::Arc};

use quire::{
    application::{
        articles::{ArticleService, AuthorArticles},
        error::AppError,
        jobs::{
            INTERRUPTED_MESSAGE, LogExportContext, LogTaskError, LogTaskService, LogTaskStore,
            WorkerPoolConfig,
        },
    },
    cache::CacheConfig,
    config,
    domain::log_tasks::LogTask,
    infra::{
        archive::ArchiveRepo, artifacts::ArtifactStore, error::InfraError,
        log_source::FileLogSource, telemetry,
    },
};
use serde_json::json;
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    let emit = || {
        error!(
            kind = %report.kind,
            error = %report.chain(),
            "application error"
        );
    };

    if dispatcher::has_been_set() {
        emit();
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, emit);
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::ExportLogs(args) => run_export_logs(settings, args).await,
        config::Command::ArticlesByAuthor(args) => run_articles_by_author(settings, args).await,
    }
}

async fn run_export_logs(
    settings: config::Settings,
    args: config::ExportLogsArgs,
) -> Result<(), AppError> {
    let artifacts = ArtifactStore::new(&settings.logs.artifact_dir).map_err(InfraError::Io)?;
    let context = LogExportContext::new(
        Arc::new(LogTaskStore::new()),
        Arc::new(FileLogSource::new(settings.logs.source_path.clone())),
        Arc::new(artifacts),
    );
    let service = LogTaskService::start(WorkerPoolConfig::from(&settings.jobs), context);

    info!(
        target = "quire::export_logs",
        date = %args.date,
        source = %settings.logs.source_path.display(),
        artifact_dir = %settings.logs.artifact_dir.display(),
        "Starting log export"
    );

    let task_id = match service.submit(&args.date) {
        Ok(task_id) => task_id,
        Err(err) => {
            service.shutdown().await;
            return Err(err.into());
        }
    };

    let waited = tokio::select! {
        outcome = service.wait_for_completion(&task_id, settings.jobs.wait_timeout) => {
            Some(outcome)
        }
        _ = signal::ctrl_c() => {
            warn!(
                target = "quire::export_logs",
                task_id = %task_id,
                "Interrupted, shutting down"
            );
            None
        }
    };

    service.shutdown().await;

    let task = service.status(&task_id)?;
    print_task(&task)?;

    match waited {
        Some(outcome) => outcome.map(|_| ()).map_err(AppError::from),
        None => Err(AppError::from(LogTaskError::Failed {
            task_id,
            message: task
                .error_message()
                .unwrap_or(INTERRUPTED_MESSAGE)
                .to_string(),
        })),
    }
}

async fn run_articles_by_author(
    settings: config::Settings,
    args: config::ArticlesByAuthorArgs,
) -> Result<(), AppError> {
    let archive_path = settings.articles.archive_path.as_ref().ok_or_else(|| {
        InfraError::configuration(
            "no article archive configured; set articles.archive_path or pass --archive",
        )
    })?;
    let repo = ArchiveRepo::open(archive_path.as_path())?;
    let service = ArticleService::with_config(
        Arc::new(repo),
        &CacheConfig::from(&settings.cache),
    )?;

    let mut articles: AuthorArticles = Arc::default();
    for attempt in 1..=args.repeat {
        articles = service.find_by_author_name(&args.author).await?;
        info!(
            target = "quire::articles_by_author",
            attempt,
            author = %args.author,
            count = articles.len(),
            "Lookup finished"
        );
    }

    let output = json!({
        "author": args.author,
        "count": articles.len(),
        "articles": &*articles,
    });
    print_json(&output)
}

fn print_task(task: &LogTask) -> Result<(), AppError> {
    let output = json!({
        "task": task,
        "download_file_name": task.download_file_name(),
    });
    print_json(&output)
}

fn print_json(value: &serde_json::Value) -> Result<(), AppError> {
    let encoded = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{encoded}");
    Ok(())
}
