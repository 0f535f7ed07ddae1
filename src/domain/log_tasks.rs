//! Log export tasks: the validated date parameter and the task state machine.

use std::{fmt, path::PathBuf};

use serde::Serialize;
use time::{Date, OffsetDateTime, format_description::FormatItem, macros::format_description};

use super::{
    error::DomainError,
    types::{LogTaskStatus, TaskId},
};

pub const LOG_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");

/// A calendar date accepted as a log export parameter (`yyyy-MM-dd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogDate(Date);

impl LogDate {
    /// Parse a strict `yyyy-MM-dd` string; the date must exist on the calendar.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes.iter().enumerate().all(|(idx, byte)| match idx {
                4 | 7 => *byte == b'-',
                _ => byte.is_ascii_digit(),
            });
        if !well_formed {
            return Err(invalid_date(value));
        }

        let date = Date::parse(value, LOG_DATE_FORMAT).map_err(|_| invalid_date(value))?;
        // Calendar years start at 1; `time` also admits year zero.
        if date.year() < 1 {
            return Err(invalid_date(value));
        }
        Ok(Self(date))
    }

    pub fn date(self) -> Date {
        self.0
    }

    /// Canonical `yyyy-MM-dd` rendering matched against log lines.
    pub fn token(self) -> String {
        let (year, month, day) = self.0.to_calendar_date();
        format!("{year:04}-{:02}-{day:02}", month as u8)
    }
}

impl fmt::Display for LogDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl Serialize for LogDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

fn invalid_date(value: &str) -> DomainError {
    DomainError::validation(format!(
        "invalid date `{value}`: expected format yyyy-MM-dd"
    ))
}

/// State of a task, carrying the data that only exists in that state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTaskState {
    Pending,
    Processing,
    Completed { file_path: PathBuf },
    Failed { error_message: String },
}

impl LogTaskState {
    pub fn status(&self) -> LogTaskStatus {
        match self {
            LogTaskState::Pending => LogTaskStatus::Pending,
            LogTaskState::Processing => LogTaskStatus::Processing,
            LogTaskState::Completed { .. } => LogTaskStatus::Completed,
            LogTaskState::Failed { .. } => LogTaskStatus::Failed,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        LogTaskState::Failed {
            error_message: message.into(),
        }
    }
}

/// Snapshot of one asynchronous log export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogTask {
    pub id: TaskId,
    pub date: LogDate,
    #[serde(flatten)]
    state: SerializedState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl LogTask {
    pub fn new(id: TaskId, date: LogDate) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            date,
            state: SerializedState(LogTaskState::Pending),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> &LogTaskState {
        &self.state.0
    }

    pub fn status(&self) -> LogTaskStatus {
        self.state.0.status()
    }

    /// Artifact location, present only once the task completed.
    pub fn file_path(&self) -> Option<&PathBuf> {
        match &self.state.0 {
            LogTaskState::Completed { file_path } => Some(file_path),
            _ => None,
        }
    }

    /// Failure detail, present only once the task failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state.0 {
            LogTaskState::Failed { error_message } => Some(error_message),
            _ => None,
        }
    }

    /// File name offered to clients downloading the artifact.
    pub fn download_file_name(&self) -> String {
        format!("logs-{}.log", self.date)
    }

    /// Move to `next`, refusing anything but a forward transition.
    pub fn advance(&mut self, next: LogTaskState) -> Result<(), DomainError> {
        let from = self.status();
        let to = next.status();
        if !from.can_advance_to(to) {
            return Err(DomainError::invalid_transition(from, to));
        }

        self.state = SerializedState(next);
        self.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SerializedState(LogTaskState);

impl Serialize for SerializedState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("status", &self.0.status())?;
        match &self.0 {
            LogTaskState::Completed { file_path } => {
                map.serialize_entry("file_path", file_path)?;
            }
            LogTaskState::Failed { error_message } => {
                map.serialize_entry("error_message", error_message)?;
            }
            LogTaskState::Pending | LogTaskState::Processing => {}
        }
        map.end()
    }
}
