//! Infrastructure adapters and runtime bootstrap.

pub mod archive;
pub mod artifacts;
pub mod error;
pub mod log_source;
pub mod telemetry;
