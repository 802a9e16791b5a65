//! Testing utilities including mock implementations.
//!
//! Every trait seam of the pipeline has a scripted mock here, so whole runs
//! can be exercised without network access. Each mock records its calls
//! for assertions.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{InferenceError, InferenceResult, NotifyError, SearchError, TransportError};
use crate::traits::{
    inference::{InferenceClient, InferenceRequest},
    notifier::Notifier,
    searcher::{SearchResult, WebSearcher},
    transport::{HttpTransport, PageRequest, PageResponse},
};

/// One scripted transport reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Reply(PageResponse),
    Error(TransportError),
    Panic,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Reply(PageResponse::new(200, body))
    }

    pub fn status(status: u16) -> Self {
        Self::Reply(PageResponse::new(status, ""))
    }

    pub fn error(error: TransportError) -> Self {
        Self::Error(error)
    }
}

/// A mock transport with per-URL scripted replies.
///
/// A URL's script is consumed in order and its last reply repeats.
/// Unscripted pages and robots.txt files answer 404. Requests without
/// browser headers are treated as robots.txt lookups and recorded apart.
#[derive(Default)]
pub struct MockTransport {
    pages: Arc<RwLock<HashMap<String, VecDeque<MockResponse>>>>,
    robots: Arc<RwLock<HashMap<String, MockResponse>>>,
    page_calls: Arc<RwLock<Vec<String>>>,
    robots_calls: Arc<RwLock<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a sequence of replies for a page URL.
    pub fn with_sequence(self, url: impl Into<String>, replies: Vec<MockResponse>) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(url.into(), replies.into_iter().collect());
        self
    }

    /// Serve `body` with HTTP 200.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_sequence(url, vec![MockResponse::ok(body)])
    }

    /// Answer every request for `url` with `status`.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.with_sequence(url, vec![MockResponse::status(status)])
    }

    /// Fail every request for `url` at the transport level.
    pub fn with_error(self, url: impl Into<String>, error: TransportError) -> Self {
        self.with_sequence(url, vec![MockResponse::Error(error)])
    }

    /// Panic inside the transport when `url` is requested.
    pub fn with_panic(self, url: impl Into<String>) -> Self {
        self.with_sequence(url, vec![MockResponse::Panic])
    }

    /// Serve a robots.txt file.
    pub fn with_robots(self, robots_url: impl Into<String>, content: impl Into<String>) -> Self {
        self.robots
            .write()
            .unwrap()
            .insert(robots_url.into(), MockResponse::ok(content));
        self
    }

    /// Fail a robots.txt lookup.
    pub fn with_robots_error(self, robots_url: impl Into<String>, error: TransportError) -> Self {
        self.robots
            .write()
            .unwrap()
            .insert(robots_url.into(), MockResponse::Error(error));
        self
    }

    /// Page requests in the order they were issued.
    pub fn page_calls(&self) -> Vec<String> {
        self.page_calls.read().unwrap().clone()
    }

    /// robots.txt requests in the order they were issued.
    pub fn robots_calls(&self) -> Vec<String> {
        self.robots_calls.read().unwrap().clone()
    }

    /// Number of page requests for one URL.
    pub fn calls_for(&self, url: &str) -> usize {
        self.page_calls
            .read()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    fn next_page_reply(&self, url: &str) -> MockResponse {
        let mut pages = self.pages.write().unwrap();
        match pages.get_mut(url) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or(MockResponse::status(404)),
            Some(script) => script.front().cloned().unwrap_or(MockResponse::status(404)),
            None => MockResponse::status(404),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, request: &PageRequest) -> Result<PageResponse, TransportError> {
        let reply = if request.browser_headers {
            self.page_calls.write().unwrap().push(request.url.clone());
            self.next_page_reply(&request.url)
        } else {
            self.robots_calls.write().unwrap().push(request.url.clone());
            self.robots
                .read()
                .unwrap()
                .get(&request.url)
                .cloned()
                .unwrap_or(MockResponse::status(404))
        };

        // Locks are released above, so a panic here poisons nothing
        match reply {
            MockResponse::Reply(response) => Ok(response),
            MockResponse::Error(error) => Err(error),
            MockResponse::Panic => panic!("mock transport panic for {}", request.url),
        }
    }
}

/// A mock web searcher returning scripted links per query.
pub struct MockWebSearcher {
    name: &'static str,
    results: Arc<RwLock<HashMap<String, Vec<SearchResult>>>>,
    failures: Arc<RwLock<Vec<String>>>,
    latency: Duration,
    calls: Arc<RwLock<Vec<(String, tokio::time::Instant)>>>,
}

impl MockWebSearcher {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            results: Arc::default(),
            failures: Arc::default(),
            latency: Duration::ZERO,
            calls: Arc::default(),
        }
    }

    /// Links returned for an exact (rendered) query string.
    pub fn with_results(self, query: impl Into<String>, urls: &[&str]) -> Self {
        let results = urls
            .iter()
            .filter_map(|url| SearchResult::from_url(url))
            .collect();
        self.results.write().unwrap().insert(query.into(), results);
        self
    }

    /// Fail the given query with a backend error.
    pub fn with_failure(self, query: impl Into<String>) -> Self {
        self.failures.write().unwrap().push(query.into());
        self
    }

    /// Simulated response time per query.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queries received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.calls.read().unwrap().iter().map(|(q, _)| q.clone()).collect()
    }

    /// Queries with the (tokio) instant each was received.
    pub fn timed_calls(&self) -> Vec<(String, tokio::time::Instant)> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        self.calls
            .write()
            .unwrap()
            .push((query.to_string(), tokio::time::Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failures.read().unwrap().iter().any(|q| q == query) {
            return Err(SearchError::Status {
                backend: self.name,
                status: 500,
                body: "mock failure".to_string(),
            });
        }

        let mut results = self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        results.truncate(limit);
        Ok(results)
    }
}

/// A mock inference client with per-reference scripted completions.
///
/// Scripts behave like [`MockTransport`]: consumed in order, the last reply
/// repeats. Unscripted references fail with a service error.
#[derive(Default)]
pub struct MockInference {
    replies: Arc<RwLock<HashMap<String, VecDeque<InferenceResult<String>>>>>,
    latency: Duration,
    calls: Arc<RwLock<Vec<InferenceRequest>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script replies for one reference URL.
    pub fn with_replies(
        self,
        reference: impl Into<String>,
        replies: Vec<InferenceResult<String>>,
    ) -> Self {
        self.replies
            .write()
            .unwrap()
            .insert(reference.into(), replies.into_iter().collect());
        self
    }

    /// Always answer `completion` for one reference URL.
    pub fn with_completion(self, reference: impl Into<String>, completion: impl Into<String>) -> Self {
        self.with_replies(reference, vec![Ok(completion.into())])
    }

    /// Simulated time per call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Requests received, in order.
    pub fn calls(&self) -> Vec<InferenceRequest> {
        self.calls.read().unwrap().clone()
    }

    pub fn calls_for(&self, reference: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.reference == reference)
            .count()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, reference: &str) -> InferenceResult<String> {
        let mut replies = self.replies.write().unwrap();
        let missing = || Err(InferenceError::Service(format!("no scripted completion for {reference}")));
        match replies.get_mut(reference) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or_else(missing),
            Some(script) => script.front().cloned().unwrap_or_else(missing),
            None => missing(),
        }
    }
}

#[async_trait]
impl InferenceClient for MockInference {
    async fn complete(&self, request: &InferenceRequest) -> InferenceResult<String> {
        self.calls.write().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = self.next_reply(&request.reference);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

/// A mock notifier that records payloads and answers a fixed status.
pub struct MockNotifier {
    status: u16,
    fail: bool,
    payloads: Arc<RwLock<Vec<String>>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self {
            status: 200,
            fail: false,
            payloads: Arc::default(),
        }
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `status` for every delivery.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Fail every delivery at the transport level.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.read().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, payload: &str) -> Result<u16, NotifyError> {
        self.payloads.write().unwrap().push(payload.to_string());
        if self.fail {
            return Err(NotifyError::Delivery("mock delivery failure".to_string()));
        }
        Ok(self.status)
    }
}
