use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use tracing::warn;

use crate::blacklist::DEFAULT_BLACKLIST_PATH;
use crate::error::{ConfigError, ConfigResult};
use crate::security::{AzureCredentials, SecretString};

/// Settings without which a run cannot start.
pub const REQUIRED_KEYS: [&str; 4] = [
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_KEY",
    "SERPER_API_KEY",
    "SERPAPI_API_KEY",
];

const DEFAULT_DEPLOYMENT: &str = "gpt-4o";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub azure: AzureCredentials,
    pub serper_api_key: SecretString,
    pub serpapi_api_key: SecretString,
    pub teams_webhook_url: Option<SecretString>,
    pub blacklist_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every missing required key is reported in a single error.
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|&&key| get(key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let required = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(vec![key.to_string()]));

        let endpoint = required("AZURE_OPENAI_ENDPOINT")?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "AZURE_OPENAI_ENDPOINT".to_string(),
                reason: "must be an http(s) URL".to_string(),
            });
        }

        let deployment = get("AZURE_OPENAI_DEPLOYMENT").unwrap_or_else(|| {
            warn!("AZURE_OPENAI_DEPLOYMENT not set, defaulting to '{}'", DEFAULT_DEPLOYMENT);
            DEFAULT_DEPLOYMENT.to_string()
        });

        let mut azure = AzureCredentials::new(endpoint, required("AZURE_OPENAI_KEY")?)
            .with_deployment(deployment);
        if let Some(version) = get("AZURE_OPENAI_API_VERSION") {
            azure = azure.with_api_version(version);
        }

        Ok(Self {
            azure,
            serper_api_key: SecretString::new(required("SERPER_API_KEY")?),
            serpapi_api_key: SecretString::new(required("SERPAPI_API_KEY")?),
            teams_webhook_url: get("TEAMS_WEBHOOK_URL").map(SecretString::new),
            blacklist_path: get("BLACKLIST_PATH")
                .unwrap_or_else(|| DEFAULT_BLACKLIST_PATH.to_string())
                .into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_all_missing_keys_reported() {
        let err = Config::from_lookup(lookup(&[("SERPER_API_KEY", "s"), ("AZURE_OPENAI_KEY", " ")]))
            .unwrap_err();

        match err {
            ConfigError::Missing(keys) => assert_eq!(
                keys,
                vec!["AZURE_OPENAI_ENDPOINT", "AZURE_OPENAI_KEY", "SERPAPI_API_KEY"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
            ("AZURE_OPENAI_KEY", "k"),
            ("SERPER_API_KEY", "s1"),
            ("SERPAPI_API_KEY", "s2"),
        ]))
        .unwrap();

        assert_eq!(config.azure.deployment, "gpt-4o");
        assert_eq!(config.azure.api_version, "2025-01-01-preview");
        assert!(config.teams_webhook_url.is_none());
        assert_eq!(config.blacklist_path, PathBuf::from("data/blacklist.json"));
        assert_eq!(config.serper_api_key.expose(), "s1");
    }

    #[test]
    fn test_optional_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
            ("AZURE_OPENAI_KEY", "k"),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o-mini"),
            ("AZURE_OPENAI_API_VERSION", "2024-10-21"),
            ("SERPER_API_KEY", "s1"),
            ("SERPAPI_API_KEY", "s2"),
            ("TEAMS_WEBHOOK_URL", "https://hooks.example/x"),
            ("BLACKLIST_PATH", "/tmp/bl.json"),
        ]))
        .unwrap();

        assert_eq!(config.azure.deployment, "gpt-4o-mini");
        assert_eq!(config.azure.api_version, "2024-10-21");
        assert!(config.teams_webhook_url.is_some());
        assert_eq!(config.blacklist_path, PathBuf::from("/tmp/bl.json"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = Config::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "res.openai.azure.com"),
            ("AZURE_OPENAI_KEY", "k"),
            ("SERPER_API_KEY", "s1"),
            ("SERPAPI_API_KEY", "s2"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
