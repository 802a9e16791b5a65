//! HTTP transport used for page and robots.txt requests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,

    /// Per-attempt timeout.
    pub timeout: Duration,

    /// Send the full browser header set. Off for robots.txt lookups.
    pub browser_headers: bool,

    /// User-agent override, used when browser headers are off.
    pub user_agent: Option<String>,
}

impl PageRequest {
    /// Page request with browser headers.
    pub fn page(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            browser_headers: true,
            user_agent: None,
        }
    }

    /// Bare request for a policy file, identifying as `user_agent`.
    pub fn robots(url: impl Into<String>, timeout: Duration, user_agent: &str) -> Self {
        Self {
            url: url.into(),
            timeout,
            browser_headers: false,
            user_agent: Some(user_agent.to_string()),
        }
    }
}

/// Status plus decoded body. Non-200 statuses are not errors here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Connection pool abstraction shared by every fetch in a run.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue one GET. Only transport-level failures are errors.
    async fn get(&self, request: &PageRequest) -> Result<PageResponse, TransportError>;
}
