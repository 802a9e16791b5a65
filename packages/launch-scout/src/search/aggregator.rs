//! Fan-out of queries across search backends.

use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexSet;
use tracing::{debug, error, info};

use crate::error::SearchError;
use crate::search::filter::{normalize_url, AggregatorFilter};
use crate::traits::searcher::{SearchResult, WebSearcher};
use crate::types::config::SearchConfig;
use crate::types::query::SearchQuery;

/// Queries every backend in parallel and merges their links into a
/// filtered, normalized candidate set.
pub struct SearchAggregator {
    searchers: Vec<Arc<dyn WebSearcher>>,
    filter: AggregatorFilter,
    config: SearchConfig,
}

impl SearchAggregator {
    pub fn new(searchers: Vec<Arc<dyn WebSearcher>>, config: SearchConfig) -> Self {
        Self {
            searchers,
            filter: AggregatorFilter::default(),
            config,
        }
    }

    pub fn with_filter(mut self, filter: AggregatorFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run every query against every backend. Backend failures only cost
    /// recall; this never fails.
    pub async fn collect(&self, queries: &[SearchQuery]) -> IndexSet<String> {
        let rendered: Vec<String> = queries.iter().map(SearchQuery::render).collect();

        let per_backend = join_all(
            self.searchers
                .iter()
                .map(|searcher| self.run_backend(searcher.as_ref(), &rendered)),
        )
        .await;

        let mut candidates = IndexSet::new();
        let mut raw = 0usize;
        let mut dropped = 0usize;

        for link in per_backend.into_iter().flatten() {
            raw += 1;
            if self.filter.is_aggregator(&link) {
                dropped += 1;
                continue;
            }
            candidates.insert(normalize_url(&link));
        }

        info!(
            queries = queries.len(),
            backends = self.searchers.len(),
            raw,
            aggregators = dropped,
            candidates = candidates.len(),
            "Search stage complete"
        );

        candidates
    }

    /// All queries for one backend, batched with a pause between batches.
    async fn run_backend(&self, searcher: &dyn WebSearcher, queries: &[String]) -> Vec<String> {
        let batch_size = self.config.batch_size.max(1);
        let mut links = Vec::new();

        for (index, batch) in queries.chunks(batch_size).enumerate() {
            if index > 0 && !self.config.batch_pause.is_zero() {
                tokio::time::sleep(self.config.batch_pause).await;
            }

            let results = join_all(batch.iter().map(|query| self.search_bounded(searcher, query))).await;

            for (query, result) in batch.iter().zip(results) {
                match result {
                    Ok(found) => {
                        debug!(backend = searcher.name(), query = %query, results = found.len(), "Query complete");
                        links.extend(found.into_iter().map(|r| r.url.to_string()));
                    }
                    Err(e) => {
                        error!(backend = searcher.name(), query = %query, error = %e, "Search failed");
                    }
                }
            }
        }

        links
    }

    /// One query, abandoned after `request_timeout`.
    async fn search_bounded(
        &self,
        searcher: &dyn WebSearcher,
        query: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let after = self.config.request_timeout;
        tokio::time::timeout(after, searcher.search(query, self.config.results_per_query))
            .await
            .unwrap_or_else(|_| {
                Err(SearchError::Timeout {
                    backend: searcher.name(),
                    after,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tokio::time::Instant;

    use crate::testing::MockWebSearcher;

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(text, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    fn rendered(text: &str) -> String {
        query(text).render()
    }

    #[tokio::test]
    async fn test_merges_filters_and_normalizes() {
        let serper = Arc::new(MockWebSearcher::new("serper").with_results(
            rendered("a"),
            &[
                "https://tool.ai/?utm_source=x",
                "https://www.reddit.com/r/ai",
                "https://launch.dev/p#top",
            ],
        ));
        let serpapi = Arc::new(
            MockWebSearcher::new("serpapi")
                .with_results(rendered("a"), &["https://tool.ai/", "https://uni.edu/x"])
                .with_failure(rendered("b")),
        );

        let aggregator = SearchAggregator::new(
            vec![serper.clone(), serpapi.clone()],
            SearchConfig::default(),
        );
        let candidates = aggregator.collect(&[query("a"), query("b")]).await;

        let mut urls: Vec<_> = candidates.into_iter().collect();
        urls.sort();
        assert_eq!(urls, vec!["https://launch.dev/p", "https://tool.ai/"]);
        assert_eq!(serper.queries().len(), 2);
        assert_eq!(serpapi.queries().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_batches_per_backend() {
        let searcher = Arc::new(MockWebSearcher::new("serper"));
        let aggregator = SearchAggregator::new(
            vec![searcher.clone()],
            SearchConfig::default()
                .with_batch_size(2)
                .with_batch_pause(Duration::from_secs(1)),
        );

        let start = Instant::now();
        aggregator
            .collect(&[query("1"), query("2"), query("3"), query("4"), query("5")])
            .await;

        let offsets: Vec<_> = searcher
            .timed_calls()
            .into_iter()
            .map(|(_, at)| at - start)
            .collect();
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backends_run_in_parallel() {
        let slow = Duration::from_secs(5);
        let a = Arc::new(MockWebSearcher::new("a").with_latency(slow));
        let b = Arc::new(MockWebSearcher::new("b").with_latency(slow));
        let aggregator = SearchAggregator::new(vec![a, b], SearchConfig::default());

        let start = Instant::now();
        aggregator.collect(&[query("x")]).await;

        assert_eq!(start.elapsed(), slow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_backend_is_abandoned_at_timeout() {
        let hung = Arc::new(
            MockWebSearcher::new("hung")
                .with_latency(Duration::from_secs(600))
                .with_results(rendered("x"), &["https://never.io/"]),
        );
        let quick = Arc::new(
            MockWebSearcher::new("quick").with_results(rendered("x"), &["https://tool.ai/"]),
        );
        let aggregator = SearchAggregator::new(
            vec![hung, quick],
            SearchConfig::default().with_request_timeout(Duration::from_secs(30)),
        );

        let start = Instant::now();
        let candidates = aggregator.collect(&[query("x")]).await;

        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(candidates.into_iter().collect::<Vec<_>>(), vec!["https://tool.ai/"]);
    }

    #[tokio::test]
    async fn test_all_backends_failing_is_empty() {
        let a = Arc::new(MockWebSearcher::new("a").with_failure(rendered("x")));
        let aggregator = SearchAggregator::new(vec![a], SearchConfig::default());

        assert!(aggregator.collect(&[query("x")]).await.is_empty());
    }
}
