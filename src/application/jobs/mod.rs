mod context;
mod error;
mod log_export;
mod pool;
mod queue;
mod service;
mod source;
mod store;

pub use context::{LOG_EXPORT_WAIT_TIMEOUT, LogExportContext};
pub use error::LogTaskError;
pub use log_export::{INTERRUPTED_MESSAGE, LogExportError, LogExportJob, process_log_export_job};
pub use pool::{
    DEFAULT_LOG_EXPORT_QUEUE_CAPACITY, DEFAULT_LOG_EXPORT_WORKERS, SubmitError, WorkerPool,
    WorkerPoolConfig,
};
pub use queue::wait_for_task_completion;
pub use service::LogTaskService;
pub use source::{LogReader, LogSource};
pub use store::{LogTaskStore, TransitionError};
