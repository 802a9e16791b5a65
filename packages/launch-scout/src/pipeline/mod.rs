//! Pipeline orchestration and result reconciliation.

pub mod orchestrator;
pub mod reconcile;

pub use orchestrator::{Pipeline, PipelineOutput};
