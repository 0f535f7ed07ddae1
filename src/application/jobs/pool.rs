use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

use thiserror::Error;
use tokio::{
    sync::{Mutex as AsyncMutex, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{config::JobsSettings, domain::types::TaskId, util::lock::mutex_lock};

use super::{
    context::LogExportContext,
    log_export::{INTERRUPTED_MESSAGE, LogExportJob, process_log_export_job, record_failure},
};

const SOURCE: &str = "application::jobs::pool";
const PANICKED_MESSAGE: &str = "export job panicked";

pub const DEFAULT_LOG_EXPORT_WORKERS: usize = 4;
pub const DEFAULT_LOG_EXPORT_QUEUE_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    pub workers: NonZeroUsize,
    pub queue_capacity: NonZeroUsize,
}

impl From<&JobsSettings> for WorkerPoolConfig {
    fn from(settings: &JobsSettings) -> Self {
        Self {
            workers: settings.log_export_workers,
            queue_capacity: settings.log_export_queue_capacity,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("log export queue is full")]
    Full,
    #[error("log export queue is closed")]
    Closed,
}

/// Fixed set of export workers fed by a bounded queue.
///
/// Submission never blocks: a full queue is reported to the caller. Each job
/// runs in its own spawned task so a panic only fails that job.
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::Sender<LogExportJob>>>,
    receiver: Arc<AsyncMutex<mpsc::Receiver<LogExportJob>>>,
    shutdown: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    context: LogExportContext,
    config: WorkerPoolConfig,
}

impl WorkerPool {
    /// Spawn the workers on the current tokio runtime.
    pub fn start(config: WorkerPoolConfig, context: LogExportContext) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.get());
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let (shutdown, _) = watch::channel(false);

        let workers = (0..config.workers.get())
            .map(|index| {
                tokio::spawn(run_worker(
                    index,
                    Arc::clone(&receiver),
                    context.clone(),
                    shutdown.subscribe(),
                ))
            })
            .collect();

        info!(
            target = SOURCE,
            workers = config.workers.get(),
            queue_capacity = config.queue_capacity.get(),
            "log export workers started"
        );

        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            shutdown,
            workers: Mutex::new(workers),
            context,
            config,
        }
    }

    /// Queue `job` without waiting for room.
    pub fn try_submit(&self, job: LogExportJob) -> Result<(), SubmitError> {
        self.try_submit_with(|| job).map(|_| ())
    }

    /// Reserve a queue slot, then build and queue the job.
    ///
    /// `build` runs only once a slot is held, so a rejected submission has no
    /// side effects. The sender lock is held throughout, which orders the job
    /// before any concurrent shutdown.
    pub fn try_submit_with<F>(&self, build: F) -> Result<TaskId, SubmitError>
    where
        F: FnOnce() -> LogExportJob,
    {
        let sender = mutex_lock(&self.sender, SOURCE, "try_submit");
        let Some(sender) = sender.as_ref() else {
            return Err(SubmitError::Closed);
        };

        let permit = sender.try_reserve().map_err(|err| match err {
            mpsc::error::TrySendError::Full(()) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(()) => SubmitError::Closed,
        })?;
        let job = build();
        let task_id = job.task_id.clone();
        permit.send(job);
        Ok(task_id)
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn config(&self) -> WorkerPoolConfig {
        self.config
    }

    /// Stop accepting jobs, interrupt running ones and fail everything still queued.
    ///
    /// Returns once every worker has exited. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let sender = mutex_lock(&self.sender, SOURCE, "shutdown").take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        info!(target = SOURCE, "stopping log export workers");
        self.shutdown.send_replace(true);

        let workers = std::mem::take(&mut *mutex_lock(&self.workers, SOURCE, "shutdown"));
        for handle in workers {
            if let Err(err) = handle.await {
                warn!(target = SOURCE, error = %err, "log export worker exited abnormally");
            }
        }

        let mut receiver = self.receiver.lock().await;
        receiver.close();
        let mut drained = 0usize;
        while let Ok(job) = receiver.try_recv() {
            if record_failure(&self.context.store, &job.task_id, INTERRUPTED_MESSAGE) {
                drained += 1;
            }
        }

        info!(
            target = SOURCE,
            drained_jobs = drained,
            "log export workers stopped"
        );
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("shutting_down", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}

async fn run_worker(
    index: usize,
    receiver: Arc<AsyncMutex<mpsc::Receiver<LogExportJob>>>,
    context: LogExportContext,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(target = SOURCE, worker = index, "log export worker ready");

    loop {
        let next = tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => None,
            job = async { receiver.lock().await.recv().await } => job,
        };
        let Some(job) = next else {
            break;
        };

        let task_id = job.task_id.clone();
        let mut handle = tokio::spawn(process_log_export_job(context.clone(), job));

        tokio::select! {
            outcome = &mut handle => {
                if let Err(err) = outcome {
                    let message = if err.is_panic() {
                        PANICKED_MESSAGE
                    } else {
                        INTERRUPTED_MESSAGE
                    };
                    error!(
                        target = SOURCE,
                        worker = index,
                        task_id = %task_id,
                        error = %err,
                        "log export job aborted"
                    );
                    record_failure(&context.store, &task_id, message);
                }
            }
            _ = stopped(&mut shutdown) => {
                handle.abort();
                let _ = handle.await;
                if record_failure(&context.store, &task_id, INTERRUPTED_MESSAGE) {
                    warn!(
                        target = SOURCE,
                        worker = index,
                        task_id = %task_id,
                        "log export interrupted by shutdown"
                    );
                }
                break;
            }
        }
    }

    debug!(target = SOURCE, worker = index, "log export worker exiting");
}

/// Resolves once shutdown is signalled or the pool is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        application::jobs::{
            source::{LogReader, LogSource},
            store::LogTaskStore,
            wait_for_task_completion,
        },
        domain::{log_tasks::LogDate, types::LogTaskStatus},
        infra::artifacts::ArtifactStore,
    };

    /// Blocks `open` until released.
    struct GatedSource {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl LogSource for GatedSource {
        async fn open(&self) -> io::Result<LogReader> {
            self.gate.notified().await;
            Ok(Box::new(io::Cursor::new(b"2024-01-15 ok\n".to_vec())))
        }

        fn describe(&self) -> String {
            "gated".to_string()
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl LogSource for PanickingSource {
        async fn open(&self) -> io::Result<LogReader> {
            panic!("source exploded");
        }

        fn describe(&self) -> String {
            "panicking".to_string()
        }
    }

    fn config(workers: usize, queue: usize) -> WorkerPoolConfig {
        WorkerPoolConfig {
            workers: NonZeroUsize::new(workers).expect("workers"),
            queue_capacity: NonZeroUsize::new(queue).expect("queue"),
        }
    }

    fn context(source: Arc<dyn LogSource>, dir: &tempfile::TempDir) -> LogExportContext {
        LogExportContext::new(
            Arc::new(LogTaskStore::new()),
            source,
            Arc::new(ArtifactStore::new(dir.path()).expect("artifacts")),
        )
    }

    fn job(store: &LogTaskStore) -> LogExportJob {
        let date = LogDate::parse("2024-01-15").expect("date");
        let task = store.create(date);
        LogExportJob {
            task_id: task.id,
            date,
        }
    }

    async fn wait_for_status(store: &LogTaskStore, job: &LogExportJob, status: LogTaskStatus) {
        for _ in 0..200 {
            if store.get(&job.task_id).map(|task| task.status()) == Some(status) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {} never reached {status}", job.task_id);
    }

    #[tokio::test]
    async fn full_queue_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gate = Arc::new(Notify::new());
        let context = context(Arc::new(GatedSource { gate: gate.clone() }), &dir);
        let pool = WorkerPool::start(config(1, 1), context.clone());

        let running = job(&context.store);
        pool.try_submit(running.clone()).expect("first job");
        wait_for_status(&context.store, &running, LogTaskStatus::Processing).await;

        pool.try_submit(job(&context.store)).expect("queued job");
        let before = context.store.len();
        assert_eq!(
            pool.try_submit_with(|| job(&context.store)),
            Err(SubmitError::Full)
        );
        assert_eq!(context.store.len(), before, "rejected job was built");

        gate.notify_waiters();
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_fails_running_and_queued_jobs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gate = Arc::new(Notify::new());
        let context = context(Arc::new(GatedSource { gate }), &dir);
        let pool = WorkerPool::start(config(1, 4), context.clone());

        let running = job(&context.store);
        let queued = job(&context.store);
        pool.try_submit(running.clone()).expect("running");
        wait_for_status(&context.store, &running, LogTaskStatus::Processing).await;
        pool.try_submit(queued.clone()).expect("queued");

        pool.shutdown().await;

        for job in [&running, &queued] {
            let task = context.store.get(&job.task_id).expect("task");
            assert_eq!(task.status(), LogTaskStatus::Failed);
            assert_eq!(task.error_message(), Some(INTERRUPTED_MESSAGE));
        }
        assert_eq!(
            pool.try_submit(job(&context.store)),
            Err(SubmitError::Closed)
        );
        assert!(pool.is_shutting_down());
        assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 0);
    }

    #[tokio::test]
    async fn panicking_job_is_failed_and_worker_survives() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = context(Arc::new(PanickingSource), &dir);
        let pool = WorkerPool::start(config(1, 4), context.clone());

        let first = job(&context.store);
        let second = job(&context.store);
        pool.try_submit(first.clone()).expect("first");
        pool.try_submit(second.clone()).expect("second");

        for job in [&first, &second] {
            let err = wait_for_task_completion(&context.store, &job.task_id, Duration::from_secs(5))
                .await
                .expect_err("panicked");
            assert!(err.to_string().contains(PANICKED_MESSAGE));
        }

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn second_shutdown_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = context(Arc::new(PanickingSource), &dir);
        let pool = WorkerPool::start(config(2, 2), context);

        pool.shutdown().await;
        pool.shutdown().await;
        assert!(pool.is_shutting_down());
    }
}
