//! Page fetch results.

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, FetchErrorKind};

/// Terminal result of fetching one URL. Exactly one per requested URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Decoded page body (HTTP 200).
    Body(String),
    /// Skipped without a page request: blacklisted domain or robots.txt refusal.
    Empty,
    /// Permanent failure, or retries exhausted.
    Failed(FetchError),
}

impl FetchOutcome {
    /// Construct a failure.
    pub fn failed(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self::Failed(FetchError::new(kind, detail))
    }

    /// Non-empty body, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Body(body) if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// One row of the per-run error report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchFailure {
    pub fn new(url: impl Into<String>, error: &FetchError) -> Self {
        Self {
            url: url.into(),
            kind: error.kind,
            detail: error.detail.clone(),
        }
    }
}
