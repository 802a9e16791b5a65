//! Serper (google.serper.dev) web searcher.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SearchError;
use crate::security::SecretString;
use crate::traits::searcher::{SearchResult, WebSearcher};

const BACKEND: &str = "serper";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ENDPOINT: &str = "https://google.serper.dev/search";

/// Serper-backed web searcher.
pub struct SerperSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    country: String,
    language: String,
}

#[derive(Serialize)]
struct Request<'a> {
    q: &'a str,
    gl: &'a str,
    hl: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    organic: Vec<Organic>,
}

#[derive(Deserialize)]
struct Organic {
    link: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
}

impl SerperSearcher {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            country: "us".to_string(),
            language: "en".to_string(),
        }
    }

    /// Set `gl` and `hl`.
    pub fn with_locale(mut self, country: impl Into<String>, language: impl Into<String>) -> Self {
        self.country = country.into();
        self.language = language.into();
        self
    }

    /// Override the endpoint (for proxies and tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Per-request timeout. A timed-out request is a [`SearchError::Http`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let request = Request {
            q: query,
            gl: &self.country,
            hl: &self.language,
            num: limit,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("X-API-KEY", self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|source| SearchError::Http {
                backend: BACKEND,
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| SearchError::Http {
            backend: BACKEND,
            source,
        })?;

        if !status.is_success() {
            return Err(SearchError::Status {
                backend: BACKEND,
                status: status.as_u16(),
                body,
            });
        }

        let results = parse_response(&body)?;
        debug!(backend = BACKEND, query = %query, results = results.len(), "Search complete");
        Ok(results)
    }
}

fn parse_response(body: &str) -> Result<Vec<SearchResult>, SearchError> {
    let response: Response = serde_json::from_str(body).map_err(|e| SearchError::Decode {
        backend: BACKEND,
        reason: e.to_string(),
    })?;

    Ok(response
        .organic
        .into_iter()
        .filter_map(|r| {
            let mut result = SearchResult::from_url(r.link.as_deref()?)?;
            if let Some(title) = r.title {
                result = result.with_title(title);
            }
            if let Some(snippet) = r.snippet {
                result = result.with_snippet(snippet);
            }
            Some(result)
        })
        .collect())
}
