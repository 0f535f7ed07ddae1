use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use thiserror::Error;

use crate::domain::{
    error::DomainError,
    log_tasks::{LogDate, LogTask, LogTaskState},
    types::{LogTaskStatus, TaskId},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("log task `{0}` does not exist")]
    UnknownTask(TaskId),
    #[error(transparent)]
    Rejected(#[from] DomainError),
}

/// Single source of truth for log task state.
///
/// Constructed explicitly and shared by the submission path and the workers.
/// Every mutation goes through [`transition`](Self::transition), which holds
/// the record's shard lock for the whole check-and-update.
#[derive(Debug)]
pub struct LogTaskStore {
    tasks: DashMap<TaskId, LogTask>,
    next_id: AtomicU64,
}

impl LogTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh id and record a pending task for `date`.
    pub fn create(&self, date: LogDate) -> LogTask {
        let id = TaskId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        let task = LogTask::new(id.clone(), date);
        self.tasks.insert(id, task.clone());
        task
    }

    pub fn get(&self, id: &TaskId) -> Option<LogTask> {
        self.tasks.get(id).map(|entry| entry.value().clone())
    }

    /// Atomically move task `id` to `next`, returning the updated snapshot.
    pub fn transition(&self, id: &TaskId, next: LogTaskState) -> Result<LogTask, TransitionError> {
        let mut entry = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| TransitionError::UnknownTask(id.clone()))?;
        entry.advance(next)?;
        Ok(entry.value().clone())
    }

    pub fn count_with_status(&self, status: LogTaskStatus) -> usize {
        self.tasks
            .iter()
            .filter(|entry| entry.value().status() == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for LogTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc, thread};

    use super::*;

    fn date() -> LogDate {
        LogDate::parse("2024-01-15").expect("date")
    }

    #[test]
    fn ids_are_monotonic_from_one() {
        let store = LogTaskStore::new();
        assert_eq!(store.create(date()).id.as_str(), "1");
        assert_eq!(store.create(date()).id.as_str(), "2");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn transition_updates_stored_snapshot() {
        let store = LogTaskStore::new();
        let task = store.create(date());

        store
            .transition(&task.id, LogTaskState::Processing)
            .expect("claim");
        let done = store
            .transition(
                &task.id,
                LogTaskState::Completed {
                    file_path: PathBuf::from("/tmp/out.log"),
                },
            )
            .expect("complete");

        assert_eq!(done.status(), LogTaskStatus::Completed);
        assert_eq!(store.get(&task.id), Some(done));
    }

    #[test]
    fn unknown_task_cannot_transition() {
        let store = LogTaskStore::new();
        let err = store
            .transition(&TaskId::from("99"), LogTaskState::Processing)
            .expect_err("unknown");
        assert_eq!(err, TransitionError::UnknownTask(TaskId::from("99")));
    }

    #[test]
    fn rejected_transition_leaves_record_untouched() {
        let store = LogTaskStore::new();
        let task = store.create(date());
        store
            .transition(&task.id, LogTaskState::failed("interrupted"))
            .expect("fail pending");

        let err = store
            .transition(&task.id, LogTaskState::Processing)
            .expect_err("terminal");
        assert!(matches!(err, TransitionError::Rejected(_)));
        assert_eq!(
            store.get(&task.id).map(|task| task.status()),
            Some(LogTaskStatus::Failed)
        );
    }

    #[test]
    fn racing_outcomes_produce_exactly_one_terminal_transition() {
        let store = Arc::new(LogTaskStore::new());
        let task = store.create(date());
        store
            .transition(&task.id, LogTaskState::Processing)
            .expect("claim");

        let handles: Vec<_> = (0..8)
            .map(|idx| {
                let store = Arc::clone(&store);
                let id = task.id.clone();
                thread::spawn(move || {
                    let next = if idx % 2 == 0 {
                        LogTaskState::Completed {
                            file_path: PathBuf::from(format!("/tmp/{idx}.log")),
                        }
                    } else {
                        LogTaskState::failed(format!("worker {idx}"))
                    };
                    store.transition(&id, next).is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(LogTaskStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| store.create(date()).id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<TaskId> = handles
            .into_iter()
            .flat_map(|handle| handle.join().expect("thread"))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(store.len(), 400);
    }
}
