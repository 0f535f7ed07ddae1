use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::domain::{log_tasks::LogTask, types::TaskId};

use super::{error::LogTaskError, store::LogTaskStore};

const DEFAULT_WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Block until the task finishes or the timeout elapses, returning the final task snapshot.
pub async fn wait_for_task_completion(
    store: &LogTaskStore,
    task_id: &TaskId,
    timeout: Duration,
) -> Result<LogTask, LogTaskError> {
    let deadline = Instant::now() + timeout;

    loop {
        let task = store
            .get(task_id)
            .ok_or_else(|| LogTaskError::NotFound(task_id.clone()))?;

        if task.status().is_terminal() {
            return match task.error_message() {
                Some(message) => Err(LogTaskError::Failed {
                    task_id: task_id.clone(),
                    message: message.to_string(),
                }),
                None => Ok(task),
            };
        }

        if Instant::now() >= deadline {
            return Err(LogTaskError::Timeout(task_id.clone()));
        }

        sleep(DEFAULT_WAIT_POLL_INTERVAL).await;
    }
}
