use thiserror::Error;

use crate::domain::types::{LogTaskStatus, TaskId};

/// Caller-facing failures of the log export pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogTaskError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("log task `{0}` not found")]
    NotFound(TaskId),
    #[error("log task `{task_id}` is not ready (status {status})")]
    NotReady {
        task_id: TaskId,
        status: LogTaskStatus,
    },
    #[error("log export queue is full")]
    ResourceExhausted,
    #[error("log export pipeline is shutting down")]
    ShuttingDown,
    #[error("log task `{0}` did not finish in time")]
    Timeout(TaskId),
    #[error("log task `{task_id}` failed: {message}")]
    Failed { task_id: TaskId, message: String },
}
