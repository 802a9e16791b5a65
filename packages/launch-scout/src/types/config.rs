//! Tunables for a pipeline run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::BackoffPolicy;

/// Configuration for page fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// URLs fetched concurrently per batch. Default: 4.
    pub batch_size: usize,

    /// Total attempts per URL, including the first. Default: 3.
    pub max_attempts: u32,

    /// Per-attempt timeout. Default: 30s.
    pub timeout: Duration,

    /// Delay between retryable failures. Default: 2s doubling.
    pub backoff: BackoffPolicy,

    /// Statuses that fail immediately without retry. Default: 403, 404.
    pub non_retryable_statuses: Vec<u16>,

    /// Timeout for robots.txt lookups. Default: 10s.
    pub robots_timeout: Duration,

    /// User-agent token matched against robots.txt groups.
    pub consent_user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            max_attempts: 3,
            timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            non_retryable_statuses: vec![403, 404],
            robots_timeout: Duration::from_secs(10),
            consent_user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn is_non_retryable(&self, status: u16) -> bool {
        self.non_retryable_statuses.contains(&status)
    }
}

/// Configuration for the inference stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Concurrent inference calls, independent of fetch batching. Default: 2.
    pub concurrency: usize,

    /// Total attempts when rate limited. Default: 3.
    pub max_attempts: u32,

    /// Delay after a rate-limit signal. Default: fixed 10s.
    pub rate_limit_backoff: BackoffPolicy,

    /// Page text cap in characters. Default: 15,000.
    pub truncation_limit: usize,

    /// Upper bound on one completion call. Default: 120s.
    pub request_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            max_attempts: 3,
            rate_limit_backoff: BackoffPolicy::fixed(Duration::from_secs(10)),
            truncation_limit: 15_000,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl InferenceConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    pub fn with_truncation_limit(mut self, limit: usize) -> Self {
        self.truncation_limit = limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Configuration for the search stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Queries issued concurrently per backend. Default: 4.
    pub batch_size: usize,

    /// Courtesy pause between batches of the same backend. Default: 1s.
    pub batch_pause: Duration,

    /// Results requested per query. Default: 38.
    pub results_per_query: usize,

    /// Country code (`gl`). Default: "us".
    pub country: String,

    /// Interface language (`hl`). Default: "en".
    pub language: String,

    /// Upper bound on one backend query. Default: 30s.
    pub request_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            batch_pause: Duration::from_secs(1),
            results_per_query: 38,
            country: "us".to_string(),
            language: "en".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SearchConfig {
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn with_results_per_query(mut self, n: usize) -> Self {
        self.results_per_query = n;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Configuration for a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub inference: InferenceConfig,

    /// Records whose publish date is older than this many days are dropped.
    #[serde(default = "default_recency_days")]
    pub recency_window_days: i64,
}

fn default_recency_days() -> i64 {
    7
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            inference: InferenceConfig::default(),
            recency_window_days: default_recency_days(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_recency_window_days(mut self, days: i64) -> Self {
        self.recency_window_days = days;
        self
    }

    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.recency_window_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new();

        assert_eq!(config.fetch.batch_size, 4);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.timeout, Duration::from_secs(30));
        assert!(config.fetch.is_non_retryable(403));
        assert!(config.fetch.is_non_retryable(404));
        assert!(!config.fetch.is_non_retryable(503));
        assert_eq!(config.inference.concurrency, 2);
        assert_eq!(config.inference.truncation_limit, 15_000);
        assert_eq!(config.inference.request_timeout, Duration::from_secs(120));
        assert_eq!(config.search.request_timeout, Duration::from_secs(30));
        assert_eq!(config.recency_window(), chrono::Duration::days(7));
    }

    #[test]
    fn test_builders_clamp_zero() {
        let fetch = FetchConfig::default().with_batch_size(0).with_max_attempts(0);
        assert_eq!(fetch.batch_size, 1);
        assert_eq!(fetch.max_attempts, 1);

        let inference = InferenceConfig::default().with_concurrency(0);
        assert_eq!(inference.concurrency, 1);
    }
}
