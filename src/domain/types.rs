use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an asynchronous log export task.
///
/// `Completed` and `Failed` are terminal and mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogTaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl LogTaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogTaskStatus::Pending => "PENDING",
            LogTaskStatus::Processing => "PROCESSING",
            LogTaskStatus::Completed => "COMPLETED",
            LogTaskStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LogTaskStatus::Completed | LogTaskStatus::Failed)
    }

    /// Forward-only transition table.
    ///
    /// `Pending -> Failed` covers tasks interrupted before any worker claimed them.
    pub fn can_advance_to(self, next: LogTaskStatus) -> bool {
        matches!(
            (self, next),
            (LogTaskStatus::Pending, LogTaskStatus::Processing)
                | (LogTaskStatus::Pending, LogTaskStatus::Failed)
                | (LogTaskStatus::Processing, LogTaskStatus::Completed)
                | (LogTaskStatus::Processing, LogTaskStatus::Failed)
        )
    }
}

impl fmt::Display for LogTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LogTaskStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(LogTaskStatus::Pending),
            "PROCESSING" => Ok(LogTaskStatus::Processing),
            "COMPLETED" => Ok(LogTaskStatus::Completed),
            "FAILED" => Ok(LogTaskStatus::Failed),
            _ => Err(()),
        }
    }
}

/// Opaque identifier handed back by task submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
