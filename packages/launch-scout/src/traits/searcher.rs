//! Web searcher trait for candidate discovery.
//!
//! Abstracts over the search providers (Serper, SerpApi). The aggregator
//! fans each query out to every configured searcher and merges the links.

use async_trait::async_trait;
use url::Url;

use crate::error::SearchError;

/// A discovered URL from web search with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The discovered URL.
    pub url: Url,

    /// Title of the page (if available from search results).
    pub title: Option<String>,

    /// Snippet/description from search results.
    pub snippet: Option<String>,
}

impl SearchResult {
    /// Create a new search result from a URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            title: None,
            snippet: None,
        }
    }

    /// Create from a URL string.
    pub fn from_url(url: &str) -> Option<Self> {
        Url::parse(url).ok().map(Self::new)
    }

    /// Add a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Web search trait for open-world discovery.
///
/// # Implementations
///
/// - `SerperSearcher` - google.serper.dev
/// - `SerpApiSearcher` - serpapi.com
/// - `MockWebSearcher` - For testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Backend name used in logs.
    fn name(&self) -> &'static str;

    /// Search the web, asking for at most `limit` organic results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;
}
