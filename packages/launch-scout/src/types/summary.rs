//! Per-run accounting.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fetch::FetchFailure;

/// Derived counts for one run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,

    /// Candidate URLs handed to the fetch stage.
    pub processed: usize,

    /// Pages fetched with a non-empty body.
    pub fetched: usize,

    pub failed: usize,

    /// Blacklisted, refused by robots.txt, or empty.
    pub skipped: usize,

    /// Pages whose extraction fell back to a rejected record.
    pub extraction_failures: usize,

    /// Itemized fetch failures, in input order.
    pub errors: Vec<FetchFailure>,

    /// Exclusion set at the end of the run.
    pub blacklisted: Vec<String>,
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            processed: 0,
            fetched: 0,
            failed: 0,
            skipped: 0,
            extraction_failures: 0,
            errors: Vec::new(),
            blacklisted: Vec::new(),
        }
    }

    /// Every processed URL lands in exactly one bucket.
    pub fn is_balanced(&self) -> bool {
        self.fetched + self.failed + self.skipped == self.processed
    }
}
