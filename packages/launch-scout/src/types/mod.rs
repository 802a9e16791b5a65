//! Data types shared across pipeline stages.

pub mod config;
pub mod fetch;
pub mod query;
pub mod record;
pub mod summary;
