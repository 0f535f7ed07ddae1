//! Quire: a bounded LRU cache for author article lookups and an asynchronous,
//! date-filtered log export pipeline.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub(crate) mod util;
