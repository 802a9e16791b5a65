//! Batched fan-out of page fetches.

use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use tracing::{error, info};

use crate::crawlers::fetcher::ResilientFetcher;
use crate::error::FetchErrorKind;
use crate::types::fetch::{FetchFailure, FetchOutcome};

/// Outcome of fetching a URL set.
#[derive(Debug, Clone, Default)]
pub struct BatchFetchReport {
    /// One outcome per distinct input URL, in input order.
    pub pages: IndexMap<String, FetchOutcome>,

    /// Failures in input order.
    pub errors: Vec<FetchFailure>,
}

impl BatchFetchReport {
    /// Pages with a non-empty body, in input order.
    pub fn bodies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages
            .iter()
            .filter_map(|(url, outcome)| outcome.body().map(|body| (url.as_str(), body)))
    }

    pub fn fetched_count(&self) -> usize {
        self.bodies().count()
    }

    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    /// Blacklisted, refused, or empty pages.
    pub fn skipped_count(&self) -> usize {
        self.pages.len() - self.fetched_count() - self.failed_count()
    }
}

/// Fetches URLs in fixed-size batches, draining each batch before the next.
pub struct BatchFetchCoordinator {
    fetcher: Arc<ResilientFetcher>,
    batch_size: usize,
}

impl BatchFetchCoordinator {
    pub fn new(fetcher: Arc<ResilientFetcher>) -> Self {
        let batch_size = fetcher.config().batch_size.max(1);
        Self {
            fetcher,
            batch_size,
        }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Fetch every URL. Never fails: a fetch task that dies is recorded as
    /// a `Panicked` failure for its URL.
    pub async fn fetch_all(&self, urls: &[String]) -> BatchFetchReport {
        let mut report = BatchFetchReport::default();
        let batches = urls.len().div_ceil(self.batch_size);

        for (index, batch) in urls.chunks(self.batch_size).enumerate() {
            let handles: Vec<_> = batch
                .iter()
                .map(|url| {
                    let fetcher = Arc::clone(&self.fetcher);
                    let url = url.clone();
                    tokio::spawn(async move { fetcher.fetch(&url).await })
                })
                .collect();

            for (url, joined) in batch.iter().zip(join_all(handles).await) {
                let outcome = joined.unwrap_or_else(|e| {
                    error!(url = %url, error = %e, "Fetch task failed");
                    FetchOutcome::failed(FetchErrorKind::Panicked, e.to_string())
                });
                report.pages.entry(url.clone()).or_insert(outcome);
            }

            info!(
                batch = index + 1,
                batches,
                urls = batch.len(),
                "Fetch batch complete"
            );
        }

        report.errors = report
            .pages
            .iter()
            .filter_map(|(url, outcome)| outcome.error().map(|e| FetchFailure::new(url, e)))
            .collect();

        info!(
            total = report.pages.len(),
            fetched = report.fetched_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            "Fetch stage complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::DomainBlacklist;
    use crate::testing::{MockResponse, MockTransport};
    use crate::types::config::FetchConfig;

    fn coordinator(transport: Arc<MockTransport>) -> BatchFetchCoordinator {
        let blacklist = DomainBlacklist::new("unused.json").shared();
        let fetcher = ResilientFetcher::new(transport, blacklist, FetchConfig::default());
        BatchFetchCoordinator::new(Arc::new(fetcher))
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_one_outcome_per_url_even_on_panic() {
        let transport = Arc::new(
            MockTransport::new()
                .with_page("https://a.io/", "a")
                .with_panic("https://boom.io/")
                .with_status("https://c.io/", 404)
                .with_page("https://d.io/", "")
                .with_page("https://e.io/", "e"),
        );
        let input = urls(&[
            "https://a.io/",
            "https://boom.io/",
            "https://c.io/",
            "https://d.io/",
            "https://e.io/",
        ]);

        let report = coordinator(transport).fetch_all(&input).await;

        assert_eq!(report.pages.len(), input.len());
        assert_eq!(report.pages.keys().cloned().collect::<Vec<_>>(), input);
        assert_eq!(
            report.pages["https://boom.io/"].error().map(|e| e.kind),
            Some(FetchErrorKind::Panicked)
        );
        assert_eq!(report.fetched_count(), 2);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.errors[0].url, "https://boom.io/");
        assert_eq!(report.errors[1].kind, FetchErrorKind::Status(404));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_drain_before_next() {
        // The slow URL in the first batch delays the whole second batch.
        let transport = Arc::new(
            MockTransport::new()
                .with_sequence(
                    "https://slow.io/",
                    vec![MockResponse::status(503), MockResponse::ok("late")],
                )
                .with_page("https://b.io/", "b")
                .with_page("https://c.io/", "c"),
        );
        let input = urls(&["https://slow.io/", "https://b.io/", "https://c.io/"]);

        let report = coordinator(transport.clone())
            .with_batch_size(2)
            .fetch_all(&input)
            .await;

        let order = transport.page_calls();
        let slow_retry = order.iter().rposition(|u| u == "https://slow.io/");
        let third = order.iter().position(|u| u == "https://c.io/");
        assert!(slow_retry < third);
        assert_eq!(report.fetched_count(), 3);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let report = coordinator(Arc::new(MockTransport::new()))
            .fetch_all(&[])
            .await;

        assert!(report.pages.is_empty());
        assert!(report.errors.is_empty());
    }
}
