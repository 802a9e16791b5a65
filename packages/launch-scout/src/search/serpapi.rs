//! SerpApi (serpapi.com) web searcher.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::SearchError;
use crate::security::SecretString;
use crate::traits::searcher::{SearchResult, WebSearcher};

const BACKEND: &str = "serpapi";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search.json";

/// SerpApi-backed web searcher using the Google engine.
pub struct SerpApiSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    country: String,
    language: String,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    link: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
}

impl SerpApiSearcher {
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

    pub fn with_locale(mut self, country: impl Into<String>, language: impl Into<String>) -> Self {
        self.country = country.into();
        self.language = language.into();
        self
    }

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
impl WebSearcher for SerpApiSearcher {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let num = limit.to_string();
        let params = [
            ("q", query),
            ("api_key", self.api_key.expose()),
            ("num", num.as_str()),
            ("hl", self.language.as_str()),
            ("gl", self.country.as_str()),
            ("engine", "google"),
        ];

        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .query(&params)
            .send()
            .await
            .map_err(|source| SearchError::Http {
                backend: BACKEND,
                source: source.without_url(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| SearchError::Http {
            backend: BACKEND,
            source: source.without_url(),
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
        .organic_results
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_organic_results() {
        let body = r#"{
            "search_metadata": {"status": "Success"},
            "organic_results": [
                {"position": 1, "title": "Launch", "link": "https://launch.dev/"},
                {"position": 2, "title": "Broken"}
            ]
        }"#;

        let results = parse_response(body).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url.as_str(), "https://launch.dev/");
    }

    #[test]
    fn test_error_payload_is_empty() {
        let results = parse_response(r#"{"error": "Invalid API key"}"#).unwrap();
        assert!(results.is_empty());
    }
}
