//! End-to-end pipeline run: search, fetch, extract, reconcile.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::ai::throttler::ExtractionThrottler;
use crate::blacklist::SharedBlacklist;
use crate::crawlers::batch::BatchFetchCoordinator;
use crate::crawlers::fetcher::ResilientFetcher;
use crate::pipeline::reconcile::{dedup_records, filter_recent, retain_accepted};
use crate::search::aggregator::SearchAggregator;
use crate::traits::inference::InferenceClient;
use crate::traits::searcher::WebSearcher;
use crate::traits::transport::HttpTransport;
use crate::types::config::PipelineConfig;
use crate::types::query::SearchQuery;
use crate::types::record::ExtractionRecord;
use crate::types::summary::RunSummary;

/// Final records plus accounting for one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<ExtractionRecord>,
    pub summary: RunSummary,
}

/// Sequences the pipeline stages.
///
/// Only the blacklist outlives a run. Response and robots caches live in
/// the fetcher, which is rebuilt for every call to [`Pipeline::run`].
pub struct Pipeline {
    aggregator: SearchAggregator,
    transport: Arc<dyn HttpTransport>,
    throttler: ExtractionThrottler,
    blacklist: SharedBlacklist,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        searchers: Vec<Arc<dyn WebSearcher>>,
        transport: Arc<dyn HttpTransport>,
        inference: Arc<dyn InferenceClient>,
        blacklist: SharedBlacklist,
        config: PipelineConfig,
    ) -> Self {
        Self {
            aggregator: SearchAggregator::new(searchers, config.search.clone()),
            transport,
            throttler: ExtractionThrottler::new(inference, config.inference.clone()),
            blacklist,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against the current time.
    pub async fn run(&self, queries: &[SearchQuery]) -> PipelineOutput {
        self.run_at(queries, Utc::now()).await
    }

    /// Run with an explicit "now" for the recency filter.
    pub async fn run_at(&self, queries: &[SearchQuery], now: DateTime<Utc>) -> PipelineOutput {
        let run_id = Uuid::now_v7();
        let span = info_span!("pipeline_run", %run_id);
        self.execute(run_id, queries, now).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        queries: &[SearchQuery],
        now: DateTime<Utc>,
    ) -> PipelineOutput {
        info!(queries = queries.len(), "Pipeline run started");
        let mut summary = RunSummary::new(run_id);

        // 1. Search
        let candidates: Vec<String> = self.aggregator.collect(queries).await.into_iter().collect();
        summary.processed = candidates.len();

        // 2. Fetch (fresh caches per run)
        let fetcher = Arc::new(ResilientFetcher::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.blacklist),
            self.config.fetch.clone(),
        ));
        let report = BatchFetchCoordinator::new(fetcher)
            .fetch_all(&candidates)
            .await;
        summary.fetched = report.fetched_count();
        summary.failed = report.failed_count();
        summary.skipped = report.skipped_count();

        // 3. Extract; the throttler enforces the inference cap
        let extracted = join_all(
            report
                .bodies()
                .map(|(url, body)| self.throttler.extract(body, url)),
        )
        .await;
        summary.extraction_failures = extracted.iter().filter(|e| e.is_fallback()).count();
        let records: Vec<ExtractionRecord> = extracted.into_iter().map(|e| e.record).collect();
        let extracted_count = records.len();

        // 4. Reconcile
        let accepted = retain_accepted(records);
        let accepted_count = accepted.len();
        let unique = dedup_records(accepted);
        let unique_count = unique.len();
        let records = filter_recent(unique, now, self.config.recency_window());

        info!(
            extracted = extracted_count,
            accepted = accepted_count,
            unique = unique_count,
            recent = records.len(),
            "Reconciliation complete"
        );

        // 5. Persist the blacklist
        let snapshot = self.blacklist.lock().await.clone();
        summary.blacklisted = snapshot.summary().iter().cloned().collect();
        match tokio::task::spawn_blocking(move || snapshot.save()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Failed to save blacklist"),
            Err(e) => error!(error = %e, "Blacklist save task failed"),
        }

        summary.errors = report.errors;

        info!(
            processed = summary.processed,
            fetched = summary.fetched,
            failed = summary.failed,
            skipped = summary.skipped,
            extraction_failures = summary.extraction_failures,
            records = records.len(),
            "Pipeline run complete"
        );

        PipelineOutput { records, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    use crate::blacklist::DomainBlacklist;
    use crate::testing::{MockInference, MockTransport, MockWebSearcher};

    #[tokio::test]
    async fn test_run_with_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist.json");
        let pipeline = Pipeline::new(
            vec![Arc::new(MockWebSearcher::new("serper"))],
            Arc::new(MockTransport::new()),
            Arc::new(MockInference::new()),
            DomainBlacklist::new(&path).shared(),
            PipelineConfig::default(),
        );
        let query = SearchQuery::new("ai", NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());

        let output = pipeline
            .run_at(&[query], Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap())
            .await;

        assert!(output.records.is_empty());
        assert_eq!(output.summary.processed, 0);
        assert!(output.summary.is_balanced());
        // Saved even when empty
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_unwritable_blacklist_does_not_fail_run() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("occupied");
        std::fs::write(&not_a_dir, "").unwrap();
        let mut seeded = DomainBlacklist::new(not_a_dir.join("blacklist.json"));
        for _ in 0..3 {
            seeded.record_failure("walled.io");
        }
        let blacklist = seeded.shared();
        let pipeline = Pipeline::new(
            vec![Arc::new(MockWebSearcher::new("serper"))],
            Arc::new(MockTransport::new()),
            Arc::new(MockInference::new()),
            blacklist.clone(),
            PipelineConfig::default(),
        );
        let query = SearchQuery::new("ai", NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());

        let output = pipeline
            .run_at(&[query], Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap())
            .await;

        assert_eq!(output.summary.blacklisted, vec!["walled.io".to_string()]);
        assert!(blacklist.try_lock().is_ok());
    }
}
