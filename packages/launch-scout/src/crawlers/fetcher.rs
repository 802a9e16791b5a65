//! Single-URL fetch with blacklist, consent, and bounded retry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::blacklist::SharedBlacklist;
use crate::crawlers::robots::ConsentChecker;
use crate::error::{FetchError, FetchErrorKind};
use crate::traits::transport::{HttpTransport, PageRequest};
use crate::types::config::FetchConfig;
use crate::types::fetch::FetchOutcome;

/// Fetches one page at a time, shared by every task in a run.
///
/// Owns the run's response cache: every terminal outcome, including
/// `Empty` and `Failed`, is remembered so a URL is requested at most once
/// per run.
pub struct ResilientFetcher {
    transport: Arc<dyn HttpTransport>,
    consent: ConsentChecker,
    blacklist: SharedBlacklist,
    config: FetchConfig,
    cache: Mutex<HashMap<String, FetchOutcome>>,
}

impl ResilientFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        blacklist: SharedBlacklist,
        config: FetchConfig,
    ) -> Self {
        let consent = ConsentChecker::new(transport.clone(), config.consent_user_agent.clone())
            .with_timeout(config.robots_timeout);

        Self {
            transport,
            consent,
            blacklist,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url`, returning exactly one terminal outcome.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        if let Some(cached) = self.cache.lock().await.get(url) {
            debug!(url = %url, "Serving fetch from run cache");
            return cached.clone();
        }

        let outcome = self.fetch_uncached(url).await;
        self.cache
            .lock()
            .await
            .insert(url.to_string(), outcome.clone());
        outcome
    }

    async fn fetch_uncached(&self, url: &str) -> FetchOutcome {
        let Some(domain) = domain_of(url) else {
            warn!(url = %url, "Unparseable URL, not fetching");
            return FetchOutcome::failed(FetchErrorKind::InvalidUrl, format!("invalid URL {}", url));
        };

        // Must happen before any network call, robots.txt included
        if self.blacklist.lock().await.is_blacklisted(&domain) {
            warn!(url = %url, domain = %domain, "Domain is blacklisted, skipping fetch");
            return FetchOutcome::Empty;
        }

        if !self.consent.is_allowed(url).await {
            warn!(url = %url, "robots.txt disallows fetching, skipping");
            return FetchOutcome::Empty;
        }

        let request = PageRequest::page(url, self.config.timeout);
        let attempts = self.config.max_attempts.max(1);
        let mut last_error = FetchError::new(FetchErrorKind::Other, "no attempt made");

        for attempt in 0..attempts {
            match self.transport.get(&request).await {
                Ok(response) if response.is_ok() => {
                    debug!(url = %url, attempt = attempt + 1, bytes = response.body.len(), "Fetched page");
                    return FetchOutcome::Body(response.body);
                }
                Ok(response) if self.config.is_non_retryable(response.status) => {
                    self.record_failure(&domain).await;
                    return FetchOutcome::failed(
                        FetchErrorKind::Status(response.status),
                        format!("HTTP {} for {}", response.status, url),
                    );
                }
                Ok(response) => {
                    last_error = FetchError::new(
                        FetchErrorKind::Status(response.status),
                        format!("HTTP {} for {}", response.status, url),
                    );
                }
                Err(e) => {
                    last_error = FetchError::new(e.kind(), format!("{} for {}", e, url));
                }
            }

            if attempt + 1 < attempts {
                let delay = self.config.backoff.delay(attempt);
                warn!(
                    url = %url,
                    attempt = attempt + 1,
                    error = %last_error,
                    delay_ms = delay.as_millis() as u64,
                    "Fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }

        self.record_failure(&domain).await;
        warn!(url = %url, attempts, error = %last_error, "Fetch failed, retries exhausted");
        FetchOutcome::Failed(last_error)
    }

    async fn record_failure(&self, domain: &str) {
        let count = self.blacklist.lock().await.record_failure(domain);
        info!(domain = %domain, failures = count, "Recorded fetch failure");
    }
}

/// Blacklist key for a URL: lower-cased host without port.
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::blacklist::DomainBlacklist;
    use crate::error::TransportError;
    use crate::testing::{MockResponse, MockTransport};
    use tokio::time::Instant;

    fn fetcher(transport: Arc<MockTransport>) -> (ResilientFetcher, SharedBlacklist) {
        let blacklist = DomainBlacklist::new("unused.json").shared();
        let fetcher = ResilientFetcher::new(transport, blacklist.clone(), FetchConfig::default());
        (fetcher, blacklist)
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://Tool.AI:8443/x").as_deref(), Some("tool.ai"));
        assert_eq!(domain_of("not a url"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_503_then_200_backs_off_once() {
        let transport = Arc::new(MockTransport::new().with_sequence(
            "https://a.io/",
            vec![MockResponse::status(503), MockResponse::ok("<html>hi</html>")],
        ));
        let (fetcher, blacklist) = fetcher(transport.clone());

        let start = Instant::now();
        let outcome = fetcher.fetch("https://a.io/").await;

        assert_eq!(outcome, FetchOutcome::Body("<html>hi</html>".into()));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(transport.calls_for("https://a.io/"), 2);
        assert_eq!(blacklist.lock().await.failure_count("a.io"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_records_failure() {
        let transport = Arc::new(MockTransport::new().with_error(
            "https://slow.io/",
            TransportError::Timeout("30s".into()),
        ));
        let (fetcher, blacklist) = fetcher(transport.clone());

        let start = Instant::now();
        let outcome = fetcher.fetch("https://slow.io/").await;

        assert_eq!(outcome.error().map(|e| e.kind), Some(FetchErrorKind::Timeout));
        // 2s + 4s between three attempts
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(transport.calls_for("https://slow.io/"), 3);
        assert_eq!(blacklist.lock().await.failure_count("slow.io"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_status_is_retried() {
        let transport = Arc::new(MockTransport::new().with_status("https://e.io/", 500));
        let (fetcher, _) = fetcher(transport.clone());

        let outcome = fetcher.fetch("https://e.io/").await;

        assert_eq!(outcome.error().map(|e| e.kind), Some(FetchErrorKind::Status(500)));
        assert_eq!(transport.calls_for("https://e.io/"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_immediately() {
        let transport = Arc::new(MockTransport::new().with_status("https://gone.io/x", 404));
        let (fetcher, blacklist) = fetcher(transport.clone());

        let start = Instant::now();
        let outcome = fetcher.fetch("https://gone.io/x").await;

        assert_eq!(outcome.error().map(|e| e.kind), Some(FetchErrorKind::Status(404)));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(transport.calls_for("https://gone.io/x"), 1);
        assert_eq!(blacklist.lock().await.failure_count("gone.io"), 1);
    }

    #[tokio::test]
    async fn test_blacklisted_after_threshold_makes_no_calls() {
        let transport = Arc::new(
            MockTransport::new()
                .with_status("https://bad.io/1", 403)
                .with_status("https://bad.io/2", 403)
                .with_status("https://bad.io/3", 403)
                .with_page("https://bad.io/4", "never served"),
        );
        let (fetcher, blacklist) = fetcher(transport.clone());

        for n in 1..=3 {
            assert!(fetcher.fetch(&format!("https://bad.io/{n}")).await.is_failed());
        }
        assert!(blacklist.lock().await.is_blacklisted("bad.io"));
        let robots_before = transport.robots_calls().len();

        let outcome = fetcher.fetch("https://BAD.io/4").await;

        assert_eq!(outcome, FetchOutcome::Empty);
        assert_eq!(transport.calls_for("https://BAD.io/4"), 0);
        assert_eq!(transport.robots_calls().len(), robots_before);
    }

    #[tokio::test]
    async fn test_robots_refusal_is_empty() {
        let transport = Arc::new(
            MockTransport::new()
                .with_robots("https://r.io/robots.txt", "User-agent: *\nDisallow: /private")
                .with_page("https://r.io/private/page", "secret"),
        );
        let (fetcher, blacklist) = fetcher(transport.clone());

        let outcome = fetcher.fetch("https://r.io/private/page").await;

        assert_eq!(outcome, FetchOutcome::Empty);
        assert_eq!(transport.calls_for("https://r.io/private/page"), 0);
        assert_eq!(blacklist.lock().await.failure_count("r.io"), 0);
    }

    #[tokio::test]
    async fn test_outcomes_are_cached() {
        let transport = Arc::new(
            MockTransport::new()
                .with_page("https://a.io/", "body")
                .with_status("https://b.io/", 404),
        );
        let (fetcher, blacklist) = fetcher(transport.clone());

        let first = fetcher.fetch("https://a.io/").await;
        let second = fetcher.fetch("https://a.io/").await;
        fetcher.fetch("https://b.io/").await;
        fetcher.fetch("https://b.io/").await;

        assert_eq!(first, second);
        assert_eq!(transport.calls_for("https://a.io/"), 1);
        assert_eq!(transport.calls_for("https://b.io/"), 1);
        assert_eq!(blacklist.lock().await.failure_count("b.io"), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_calls() {
        let transport = Arc::new(MockTransport::new());
        let (fetcher, _) = fetcher(transport.clone());

        let outcome = fetcher.fetch("::nope::").await;

        assert_eq!(outcome.error().map(|e| e.kind), Some(FetchErrorKind::InvalidUrl));
        assert!(transport.page_calls().is_empty());
        assert!(transport.robots_calls().is_empty());
    }
}
