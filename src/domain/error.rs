use thiserror::Error;

use super::types::LogTaskStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("log task cannot move from {from} to {to}")]
    InvalidTransition {
        from: LogTaskStatus,
        to: LogTaskStatus,
    },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_transition(from: LogTaskStatus, to: LogTaskStatus) -> Self {
        Self::InvalidTransition { from, to }
    }
}
