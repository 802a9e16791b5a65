//! Pure OpenAI REST API client
//!
//! A clean, minimal chat-completion client with no domain-specific logic.
//! Talks to either the public OpenAI API or an Azure OpenAI deployment.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::azure(
//!     "https://my-resource.openai.azure.com",
//!     api_key,
//!     "gpt-4o",
//!     "2025-01-01-preview",
//! );
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("gpt-4o")
//!         .message(Message::system("You are terse."))
//!         .message(Message::user("Hello!")),
//! ).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// How requests are authenticated.
#[derive(Clone)]
enum Auth {
    /// `Authorization: Bearer <key>` (api.openai.com)
    Bearer(String),
    /// `api-key: <key>` (Azure OpenAI)
    AzureKey(String),
}

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    auth: Auth,
    base_url: String,
    api_version: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            auth: Auth::Bearer(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            api_version: None,
            timeout: None,
        }
    }

    /// Create a client bound to one Azure OpenAI deployment.
    pub fn azure(
        endpoint: &str,
        api_key: impl Into<String>,
        deployment: &str,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            http_client: Client::new(),
            auth: Auth::AzureKey(api_key.into()),
            base_url: format!(
                "{}/openai/deployments/{}",
                endpoint.trim_end_matches('/'),
                deployment
            ),
            api_version: Some(api_version.into()),
            timeout: None,
        }
    }

    /// Set a custom base URL (for proxies, test servers, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Abandon a request that has not completed within `timeout`.
    /// Reported as [`OpenAIError::Network`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completion API and get a response.
    /// HTTP 429 is reported as [`OpenAIError::RateLimited`].
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let mut builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json");

        builder = match &self.auth {
            Auth::Bearer(key) => builder.header("Authorization", format!("Bearer {}", key)),
            Auth::AzureKey(key) => builder.header("api-key", key),
        };

        if let Some(version) = &self.api_version {
            builder = builder.query(&[("api-version", version)]);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.json(&request).send().await.map_err(|e| {
            warn!(error = %e, "OpenAI request failed");
            OpenAIError::Network(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "OpenAI rate limit hit");
            return Err(OpenAIError::RateLimited(error_text));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OpenAIError::Api("No response from OpenAI".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com");

        assert_eq!(client.base_url(), "https://custom.api.com");
        assert!(client.api_version.is_none());
        assert!(client.timeout.is_none());
    }

    #[test]
    fn test_timeout_builder() {
        let client = OpenAIClient::new("sk-test").with_timeout(Duration::from_secs(120));

        assert_eq!(client.timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_azure_base_url() {
        let client = OpenAIClient::azure(
            "https://res.openai.azure.com/",
            "key",
            "gpt-4o",
            "2025-01-01-preview",
        );

        assert_eq!(
            client.base_url(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o"
        );
        assert_eq!(client.api_version.as_deref(), Some("2025-01-01-preview"));
        assert!(matches!(client.auth, Auth::AzureKey(_)));
    }

    #[test]
    fn test_rate_limited_predicate() {
        assert!(OpenAIError::RateLimited("slow down".into()).is_rate_limited());
        assert!(!OpenAIError::Api("bad request".into()).is_rate_limited());
    }
}
