use std::{io, path::PathBuf, time::Instant};

use metrics::{counter, histogram};
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufWriter},
};
use tracing::{debug, error, info, warn};

use crate::domain::{
    log_tasks::{LogDate, LogTaskState},
    types::TaskId,
};

use super::{context::LogExportContext, store::LogTaskStore};

const SOURCE: &str = "application::jobs::log_export";

/// Failure detail recorded when a worker is stopped before finishing.
pub const INTERRUPTED_MESSAGE: &str = "processing interrupted";

/// Work item handed from the submission path to the worker pool.
#[derive(Debug, Clone)]
pub struct LogExportJob {
    pub task_id: TaskId,
    pub date: LogDate,
}

#[derive(Debug, Error)]
pub enum LogExportError {
    #[error("failed to read log source `{origin}`: {error}")]
    Source {
        origin: String,
        #[source]
        error: io::Error,
    },
    #[error("failed to write log artifact: {0}")]
    Artifact(#[source] io::Error),
}

#[derive(Debug)]
struct ExportOutcome {
    path: PathBuf,
    matched_lines: u64,
}

/// Run one export: claim the task, filter the log into an artifact and record
/// exactly one terminal outcome.
///
/// Errors never escape; they end up on the task record.
pub async fn process_log_export_job(context: LogExportContext, job: LogExportJob) {
    let started_at = Instant::now();

    if let Err(err) = context
        .store
        .transition(&job.task_id, LogTaskState::Processing)
    {
        warn!(
            target = SOURCE,
            task_id = %job.task_id,
            error = %err,
            "log export task could not be claimed"
        );
        return;
    }

    info!(
        target = SOURCE,
        task_id = %job.task_id,
        date = %job.date,
        source = %context.source.describe(),
        "starting log export"
    );

    match export_matching_lines(&context, job.date).await {
        Ok(outcome) => {
            let completed = LogTaskState::Completed {
                file_path: outcome.path.clone(),
            };
            match context.store.transition(&job.task_id, completed) {
                Ok(_) => {
                    counter!("quire_log_task_completed_total").increment(1);
                    histogram!("quire_log_task_duration_ms")
                        .record(started_at.elapsed().as_secs_f64() * 1000.0);
                    info!(
                        target = SOURCE,
                        task_id = %job.task_id,
                        path = %outcome.path.display(),
                        matched_lines = outcome.matched_lines,
                        elapsed_ms = started_at.elapsed().as_millis() as u64,
                        "log export completed"
                    );
                }
                Err(err) => {
                    // Someone else already recorded an outcome; the artifact is orphaned.
                    let _ = std::fs::remove_file(&outcome.path);
                    warn!(
                        target = SOURCE,
                        task_id = %job.task_id,
                        error = %err,
                        "log export finished after the task was already settled"
                    );
                }
            }
        }
        Err(err) => {
            error!(
                target = SOURCE,
                task_id = %job.task_id,
                error = %err,
                "log export failed"
            );
            record_failure(&context.store, &job.task_id, &err.to_string());
        }
    }
}

/// Mark `task_id` failed unless it already reached a terminal state.
pub(crate) fn record_failure(store: &LogTaskStore, task_id: &TaskId, message: &str) -> bool {
    match store.transition(task_id, LogTaskState::failed(message)) {
        Ok(_) => {
            counter!("quire_log_task_failed_total").increment(1);
            true
        }
        Err(err) => {
            debug!(
                target = SOURCE,
                task_id = %task_id,
                error = %err,
                "failure not recorded"
            );
            false
        }
    }
}

async fn export_matching_lines(
    context: &LogExportContext,
    date: LogDate,
) -> Result<ExportOutcome, LogExportError> {
    let token = date.token();
    let source_error = |error| LogExportError::Source {
        origin: context.source.describe(),
        error,
    };

    let reader = context.source.open().await.map_err(source_error)?;
    let artifact = context
        .artifacts
        .create(&format!("logs-{token}-"), ".log")
        .map_err(LogExportError::Artifact)?;
    let handle = artifact
        .as_file()
        .try_clone()
        .map_err(LogExportError::Artifact)?;
    let mut writer = BufWriter::new(File::from_std(handle));

    let mut lines = reader.lines();
    let mut matched_lines = 0u64;
    while let Some(line) = lines.next_line().await.map_err(source_error)? {
        if !line.contains(token.as_str()) {
            continue;
        }
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(LogExportError::Artifact)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(LogExportError::Artifact)?;
        matched_lines += 1;
    }

    writer.flush().await.map_err(LogExportError::Artifact)?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(LogExportError::Artifact)?;

    // No await point between persisting and the caller's Completed transition.
    let path = context
        .artifacts
        .persist(artifact)
        .map_err(LogExportError::Artifact)?;

    Ok(ExportOutcome {
        path,
        matched_lines,
    })
}
