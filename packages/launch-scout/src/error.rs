//! Typed errors for the discovery pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Only [`ConfigError`]
//! is ever fatal; every other error is recovered per URL or per query and
//! surfaced through the run summary.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Missing or malformed settings. Raised before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required settings are absent.
    #[error("missing critical configuration: {}. Check your .env file and ensure all required API keys are set", .0.join(", "))]
    Missing(Vec<String>),

    /// A setting is present but unusable.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Classification of a page fetch failure.
///
/// Serialized as its display token (`"http_404"`, `"timeout"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FetchErrorKind {
    /// Terminal HTTP status (non-retryable, or retries exhausted).
    Status(u16),
    /// Per-attempt timeout elapsed on the final attempt.
    Timeout,
    /// Connection-level failure on the final attempt.
    Connection,
    /// URL could not be parsed or has no host.
    InvalidUrl,
    /// The fetch task itself died.
    Panicked,
    /// Anything else the transport reported.
    Other,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "http_{}", code),
            Self::Timeout => f.write_str("timeout"),
            Self::Connection => f.write_str("connection"),
            Self::InvalidUrl => f.write_str("invalid_url"),
            Self::Panicked => f.write_str("panicked"),
            Self::Other => f.write_str("other"),
        }
    }
}

impl FromStr for FetchErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(Self::Timeout),
            "connection" => Ok(Self::Connection),
            "invalid_url" => Ok(Self::InvalidUrl),
            "panicked" => Ok(Self::Panicked),
            "other" => Ok(Self::Other),
            _ => s
                .strip_prefix("http_")
                .and_then(|code| code.parse().ok())
                .map(Self::Status)
                .ok_or_else(|| format!("unknown fetch error kind: {}", s)),
        }
    }
}

impl From<FetchErrorKind> for String {
    fn from(kind: FetchErrorKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for FetchErrorKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A terminal fetch failure for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Errors surfaced by an [`HttpTransport`](crate::traits::transport::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Map to the fetch failure taxonomy.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout(_) => FetchErrorKind::Timeout,
            Self::Connection(_) => FetchErrorKind::Connection,
            Self::Other(_) => FetchErrorKind::Other,
        }
    }
}

/// Search backend failures. Always degraded to an empty result list.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{backend} request failed: {source}")]
    Http {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} returned HTTP {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("{backend} response could not be decoded: {reason}")]
    Decode {
        backend: &'static str,
        reason: String,
    },

    #[error("{backend} gave no answer within {after:?}")]
    Timeout {
        backend: &'static str,
        after: Duration,
    },
}

/// Failures reported by an inference service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The service asked us to slow down. Retried with a fixed delay.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other service failure. Assumed non-transient.
    #[error("inference service error: {0}")]
    Service(String),
}

impl InferenceError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Failure to turn a page into an [`ExtractionRecord`](crate::types::record::ExtractionRecord).
///
/// Never fatal: the throttler pairs it with a fallback record.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("extraction failed for {url}: {source}")]
    Inference {
        url: String,
        #[source]
        source: InferenceError,
    },

    #[error("completion for {url} contained no JSON object")]
    NonJson { url: String },

    #[error("completion for {url} could not be parsed: {reason}")]
    Parse { url: String, reason: String },

    #[error("inference limiter closed")]
    LimiterClosed,
}

/// Blacklist persistence failures.
#[derive(Debug, Error)]
pub enum BlacklistError {
    #[error("blacklist I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("blacklist serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Notification delivery failures.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification not delivered: {0}")]
    Delivery(String),
}

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for inference calls.
pub type InferenceResult<T> = std::result::Result<T, InferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_lists_every_key() {
        let err = ConfigError::Missing(vec!["SERPER_API_KEY".into(), "AZURE_OPENAI_KEY".into()]);
        let message = err.to_string();

        assert!(message.contains("SERPER_API_KEY, AZURE_OPENAI_KEY"));
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::new(FetchErrorKind::Status(404), "HTTP 404 for https://a.io/");
        assert_eq!(err.to_string(), "http_404: HTTP 404 for https://a.io/");
    }

    #[test]
    fn test_fetch_error_kind_parses_display_token() {
        assert_eq!("http_503".parse::<FetchErrorKind>(), Ok(FetchErrorKind::Status(503)));
        assert_eq!("invalid_url".parse::<FetchErrorKind>(), Ok(FetchErrorKind::InvalidUrl));
        assert!("http_".parse::<FetchErrorKind>().is_err());
        assert!("exploded".parse::<FetchErrorKind>().is_err());
    }

    #[test]
    fn test_transport_error_kind() {
        assert_eq!(
            TransportError::Timeout("30s".into()).kind(),
            FetchErrorKind::Timeout
        );
        assert_eq!(
            TransportError::Connection("refused".into()).kind(),
            FetchErrorKind::Connection
        );
    }
}
