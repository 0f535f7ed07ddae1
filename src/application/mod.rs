//! Application services: cached article queries and the log export pipeline.

pub mod articles;
pub mod error;
pub mod jobs;
pub mod repos;
