//! Robots.txt parser and consent checker.
//!
//! Only `User-agent` and `Disallow` lines are honoured. Anything that goes
//! wrong while looking up a policy file resolves to "allowed".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::traits::transport::{HttpTransport, PageRequest};

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsTxt {
    groups: Vec<AgentGroup>,
}

/// Consecutive `User-agent` lines and the `Disallow` rules that follow them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AgentGroup {
    /// User-agent values as written (trimmed)
    agents: Vec<String>,

    /// Disallowed path prefixes (empty values dropped)
    disallow: Vec<String>,
}

impl AgentGroup {
    fn applies_to(&self, user_agent: &str) -> bool {
        self.agents
            .iter()
            .any(|agent| agent == "*" || agent.contains(user_agent))
    }
}

impl RobotsTxt {
    /// Parse robots.txt content. Unknown directives are ignored.
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current = AgentGroup::default();
        let mut in_agent_block = false;

        for line in content.lines() {
            // Strip trailing comments
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match directive.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if !in_agent_block && !current.agents.is_empty() {
                        robots.groups.push(std::mem::take(&mut current));
                    }
                    current.agents.push(value.to_string());
                    in_agent_block = true;
                }
                "disallow" => {
                    in_agent_block = false;
                    if !value.is_empty() {
                        current.disallow.push(value.to_string());
                    }
                }
                _ => {
                    in_agent_block = false;
                }
            }
        }

        if !current.agents.is_empty() {
            robots.groups.push(current);
        }

        robots
    }

    /// Check if a path is allowed for a user-agent token.
    ///
    /// Disallowed when any group naming `*` or containing the token has a
    /// `Disallow` prefix matching the path.
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        !self
            .groups
            .iter()
            .filter(|group| group.applies_to(user_agent))
            .flat_map(|group| group.disallow.iter())
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Per-host robots.txt lookups, cached for the lifetime of the checker.
///
/// One checker is created per pipeline run, so nothing leaks between runs.
pub struct ConsentChecker {
    transport: Arc<dyn HttpTransport>,
    user_agent: String,
    timeout: Duration,
    cache: Mutex<HashMap<String, Arc<RobotsTxt>>>,
}

impl ConsentChecker {
    pub fn new(transport: Arc<dyn HttpTransport>, user_agent: impl Into<String>) -> Self {
        Self {
            transport,
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(10),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the site's policy file permits fetching `url`.
    pub async fn is_allowed(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) if parsed.has_host() => parsed,
            _ => {
                warn!(url = %url, "Invalid URL for robots.txt check, allowing");
                return true;
            }
        };

        let Some(robots_url) = robots_url(&parsed) else {
            return true;
        };

        let robots = self.lookup(&robots_url).await;
        let allowed = robots.is_allowed(&self.user_agent, parsed.path());
        if !allowed {
            debug!(url = %url, robots = %robots_url, "Disallowed by robots.txt");
        }
        allowed
    }

    /// Cached policy for one robots.txt URL. Failures cache an empty policy.
    async fn lookup(&self, robots_url: &str) -> Arc<RobotsTxt> {
        if let Some(cached) = self.cache.lock().await.get(robots_url) {
            return Arc::clone(cached);
        }

        let request = PageRequest::robots(robots_url, self.timeout, &self.user_agent);
        let robots = match self.transport.get(&request).await {
            Ok(response) if response.is_ok() => RobotsTxt::parse(&response.body),
            Ok(response) => {
                debug!(robots = %robots_url, status = response.status, "No robots.txt, allowing");
                RobotsTxt::default()
            }
            Err(e) => {
                warn!(robots = %robots_url, error = %e, "Error fetching robots.txt, allowing");
                RobotsTxt::default()
            }
        };

        let robots = Arc::new(robots);
        self.cache
            .lock()
            .await
            .entry(robots_url.to_string())
            .or_insert_with(|| Arc::clone(&robots));
        robots
    }

    /// Number of policy files cached so far.
    pub async fn cached_hosts(&self) -> usize {
        self.cache.lock().await.len()
    }
}

/// `scheme://host[:port]/robots.txt` for a page URL.
fn robots_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    })
}
