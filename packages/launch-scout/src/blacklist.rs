//! Durable per-domain failure tracking.
//!
//! Domains that fail to fetch repeatedly are excluded from future runs.
//! The store is a single JSON file:
//!
//! ```json
//! { "blacklist": ["dead.example"], "failures": { "dead.example": 3, "flaky.io": 1 } }
//! ```
//!
//! `DomainBlacklist` has no locking of its own. The fetcher shares it as
//! [`SharedBlacklist`] so concurrent fetch tasks serialize their updates.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::BlacklistError;

/// Failures before a domain is excluded.
pub const FAILURE_THRESHOLD: u32 = 3;

/// Default location of the backing file.
pub const DEFAULT_BLACKLIST_PATH: &str = "data/blacklist.json";

/// Blacklist handle shared between concurrent fetches.
pub type SharedBlacklist = Arc<Mutex<DomainBlacklist>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct BlacklistFile {
    #[serde(default)]
    blacklist: Vec<String>,
    #[serde(default)]
    failures: BTreeMap<String, u32>,
}

/// Failure counters plus the exclusion set, keyed by lower-cased host.
#[derive(Debug, Clone)]
pub struct DomainBlacklist {
    path: PathBuf,
    threshold: u32,
    domains: BTreeSet<String>,
    failures: BTreeMap<String, u32>,
}

impl DomainBlacklist {
    /// Empty, in-memory blacklist that will save to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            threshold: FAILURE_THRESHOLD,
            domains: BTreeSet::new(),
            failures: BTreeMap::new(),
        }
    }

    /// Load from `path`. A missing or unreadable file yields an empty blacklist.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut blacklist = Self::new(path);

        let raw = match std::fs::read_to_string(&blacklist.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %blacklist.path.display(), "No blacklist file, starting empty");
                return blacklist;
            }
            Err(e) => {
                warn!(path = %blacklist.path.display(), error = %e, "Blacklist unreadable, starting empty");
                return blacklist;
            }
        };

        match serde_json::from_str::<BlacklistFile>(&raw) {
            Ok(file) => {
                blacklist.domains = file.blacklist.iter().map(|d| d.to_lowercase()).collect();
                for (domain, count) in file.failures {
                    *blacklist.failures.entry(domain.to_lowercase()).or_insert(0) += count;
                }
                info!(
                    path = %blacklist.path.display(),
                    blacklisted = blacklist.domains.len(),
                    tracked = blacklist.failures.len(),
                    "Loaded domain blacklist"
                );
            }
            Err(e) => {
                warn!(path = %blacklist.path.display(), error = %e, "Blacklist corrupt, starting empty");
            }
        }

        blacklist
    }

    /// Override the failure threshold.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    /// Wrap for sharing across fetch tasks.
    pub fn shared(self) -> SharedBlacklist {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact, case-insensitive host match.
    pub fn is_blacklisted(&self, domain: &str) -> bool {
        self.domains.contains(&domain.to_lowercase())
    }

    /// Count one more failure. Returns the new count.
    pub fn record_failure(&mut self, domain: &str) -> u32 {
        let domain = domain.to_lowercase();
        let count = self.failures.entry(domain.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        if count >= self.threshold && self.domains.insert(domain.clone()) {
            info!(domain = %domain, failures = count, "Domain blacklisted");
        } else {
            debug!(domain = %domain, failures = count, "Recorded domain failure");
        }

        count
    }

    pub fn failure_count(&self, domain: &str) -> u32 {
        self.failures
            .get(&domain.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Current exclusion set.
    pub fn summary(&self) -> &BTreeSet<String> {
        &self.domains
    }

    /// Persist counters and exclusion set, replacing the whole file.
    ///
    /// Writes to a sibling temp file and renames it over the target.
    /// Blocking; async callers save a clone from `spawn_blocking`.
    pub fn save(&self) -> Result<(), BlacklistError> {
        let io_err = |source: std::io::Error| BlacklistError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = BlacklistFile {
            blacklist: self.domains.iter().cloned().collect(),
            failures: self.failures.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), domains = self.domains.len(), "Saved blacklist");
        Ok(())
    }
}
