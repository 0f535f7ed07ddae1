use std::{path::PathBuf, sync::Arc, time::Duration};

use metrics::counter;
use tracing::{info, warn};

use crate::domain::{
    log_tasks::{LogDate, LogTask},
    types::{LogTaskStatus, TaskId},
};

use super::{
    context::LogExportContext,
    error::LogTaskError,
    log_export::LogExportJob,
    pool::{SubmitError, WorkerPool, WorkerPoolConfig},
    queue::wait_for_task_completion,
    store::LogTaskStore,
};

const SOURCE: &str = "application::jobs::service";

/// Entry point for callers of the log export pipeline.
///
/// `submit` returns as soon as the task is queued; progress is observed
/// through `status`, `result_path` or `wait_for_completion`.
#[derive(Debug)]
pub struct LogTaskService {
    store: Arc<LogTaskStore>,
    pool: WorkerPool,
}

impl LogTaskService {
    /// Start the worker pool and wrap it in a service.
    pub fn start(config: WorkerPoolConfig, context: LogExportContext) -> Self {
        let store = Arc::clone(&context.store);
        let pool = WorkerPool::start(config, context);
        Self { store, pool }
    }

    pub fn store(&self) -> &Arc<LogTaskStore> {
        &self.store
    }

    /// Validate `date`, record a pending task and queue it for export.
    ///
    /// The record is created only after a queue slot is reserved, so a
    /// rejected submission never allocates an id or exposes a task.
    pub fn submit(&self, date: &str) -> Result<TaskId, LogTaskError> {
        let date =
            LogDate::parse(date).map_err(|err| LogTaskError::InvalidArgument(err.to_string()))?;

        if self.pool.is_shutting_down() {
            counter!("quire_log_task_rejected_total", "reason" => "shutdown").increment(1);
            return Err(LogTaskError::ShuttingDown);
        }

        let submitted = self.pool.try_submit_with(|| LogExportJob {
            task_id: self.store.create(date).id,
            date,
        });
        let task_id = match submitted {
            Ok(task_id) => task_id,
            Err(err) => {
                let (reason, error) = match err {
                    SubmitError::Full => ("queue_full", LogTaskError::ResourceExhausted),
                    SubmitError::Closed => ("shutdown", LogTaskError::ShuttingDown),
                };
                counter!("quire_log_task_rejected_total", "reason" => reason).increment(1);
                warn!(
                    target = SOURCE,
                    date = %date,
                    reason,
                    "log export submission rejected"
                );
                return Err(error);
            }
        };

        counter!("quire_log_task_submitted_total").increment(1);
        info!(
            target = SOURCE,
            task_id = %task_id,
            date = %date,
            "log export task submitted"
        );

        Ok(task_id)
    }

    /// Current snapshot of task `id`.
    pub fn status(&self, id: &TaskId) -> Result<LogTask, LogTaskError> {
        self.store
            .get(id)
            .ok_or_else(|| LogTaskError::NotFound(id.clone()))
    }

    /// Artifact path of a completed task.
    pub fn result_path(&self, id: &TaskId) -> Result<PathBuf, LogTaskError> {
        let task = self.status(id)?;
        match task.file_path() {
            Some(path) => Ok(path.clone()),
            None => Err(LogTaskError::NotReady {
                task_id: id.clone(),
                status: task.status(),
            }),
        }
    }

    pub async fn wait_for_completion(
        &self,
        id: &TaskId,
        timeout: Duration,
    ) -> Result<LogTask, LogTaskError> {
        wait_for_task_completion(&self.store, id, timeout).await
    }

    /// Number of tasks in `status`, mostly useful for diagnostics.
    pub fn count_with_status(&self, status: LogTaskStatus) -> usize {
        self.store.count_with_status(status)
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use std::{io, num::NonZeroUsize};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        application::jobs::source::{LogReader, LogSource},
        infra::artifacts::ArtifactStore,
    };

    struct StaticSource;

    #[async_trait]
    impl LogSource for StaticSource {
        async fn open(&self) -> io::Result<LogReader> {
            Ok(Box::new(io::Cursor::new(
                b"2024-01-15 a\n2024-01-16 b\n".to_vec(),
            )))
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn service(dir: &tempfile::TempDir) -> LogTaskService {
        let context = LogExportContext::new(
            Arc::new(LogTaskStore::new()),
            Arc::new(StaticSource),
            Arc::new(ArtifactStore::new(dir.path()).expect("artifacts")),
        );
        LogTaskService::start(
            WorkerPoolConfig {
                workers: NonZeroUsize::new(2).expect("workers"),
                queue_capacity: NonZeroUsize::new(8).expect("queue"),
            },
            context,
        )
    }

    #[tokio::test]
    async fn invalid_dates_create_no_task() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(&dir);

        for input in ["", "2024-13-01", "2024-02-30", "15-01-2024", "2024/01/15"] {
            let err = service.submit(input).expect_err(input);
            assert!(matches!(err, LogTaskError::InvalidArgument(_)), "{input}");
        }
        assert!(service.store().is_empty());

        service.shutdown().await;
    }

    #[tokio::test]
    async fn completed_task_exposes_its_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(&dir);

        let id = service.submit("2024-01-16").expect("submit");
        let task = service
            .wait_for_completion(&id, Duration::from_secs(5))
            .await
            .expect("complete");

        let path = service.result_path(&id).expect("path");
        assert_eq!(task.file_path(), Some(&path));
        assert_eq!(
            std::fs::read_to_string(path).expect("artifact"),
            "2024-01-16 b\n"
        );
        assert_eq!(service.count_with_status(LogTaskStatus::Completed), 1);

        service.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(&dir);
        let missing = TaskId::from("404");

        assert_eq!(
            service.status(&missing),
            Err(LogTaskError::NotFound(missing.clone()))
        );
        assert_eq!(
            service.result_path(&missing),
            Err(LogTaskError::NotFound(missing))
        );

        service.shutdown().await;
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(&dir);
        service.shutdown().await;

        assert_eq!(
            service.submit("2024-01-15"),
            Err(LogTaskError::ShuttingDown)
        );
        assert!(service.store().is_empty());
    }
}
