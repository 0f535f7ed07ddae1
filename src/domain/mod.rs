//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod log_tasks;
pub mod types;
