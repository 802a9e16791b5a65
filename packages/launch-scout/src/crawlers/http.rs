//! reqwest-backed transport with a browser-like header set.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::TransportError;
use crate::traits::transport::{HttpTransport, PageRequest, PageResponse};

/// Chrome desktop user-agent sent with page requests.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Header set sent with every page request.
///
/// `Accept-Encoding` is left to reqwest so it can decompress gzip,
/// deflate and brotli bodies itself.
const BROWSER_HEADERS: [(&str, &str); 11] = [
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
    ("pragma", "no-cache"),
    ("referer", "https://www.google.com/"),
];

/// Build the page header map.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(BROWSER_HEADERS.len() + 1);
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(BROWSER_USER_AGENT),
    );
    for (name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Shared connection pool for one pipeline run.
///
/// Certificate verification is disabled: many freshly launched product
/// sites serve self-signed or misconfigured certificates.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            headers: browser_headers(),
        })
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &PageRequest) -> Result<PageResponse, TransportError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        if request.browser_headers {
            builder = builder.headers(self.headers.clone());
        } else if let Some(agent) = &request.user_agent {
            builder = builder.header(reqwest::header::USER_AGENT, agent);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();

        // Non-200 bodies are never used
        if status != 200 {
            debug!(url = %request.url, status, "Non-200 response");
            return Ok(PageResponse::new(status, String::new()));
        }

        // Declared charset, else UTF-8, with lossy replacement
        let body = response.text().await.map_err(map_error)?;
        Ok(PageResponse::new(status, body))
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() {
        TransportError::Connection(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers();

        assert_eq!(headers.len(), BROWSER_HEADERS.len() + 1);
        assert_eq!(
            headers.get("user-agent").and_then(|v| v.to_str().ok()),
            Some(BROWSER_USER_AGENT)
        );
        assert_eq!(
            headers.get("referer").and_then(|v| v.to_str().ok()),
            Some("https://www.google.com/")
        );
        assert!(headers.get("accept-encoding").is_none());
    }

    #[test]
    fn test_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
