//! Structured output of page extraction.

use serde::{Deserialize, Serialize};

/// Whether the inference service judged the page to be a product launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Accepted,
    #[default]
    Rejected,
}

impl Classification {
    /// Map a model-provided label. Unknown or missing labels are rejected.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("accepted") | Some("ai_tool") => Self::Accepted,
            _ => Self::Rejected,
        }
    }

    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// One extracted product record. Produced exactly once per fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub title: String,

    /// Canonical product website (defaults to the source URL).
    pub website: String,

    /// Page the record was extracted from.
    pub source_url: String,

    pub summary: String,

    #[serde(default)]
    pub features: Vec<String>,

    pub pricing: Option<String>,

    pub target_audience: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub classification: Classification,

    /// Self-reported by the model; ISO date or date-time, unvalidated.
    pub publish_date: Option<String>,

    /// Truncated page text that was sent for extraction.
    #[serde(default)]
    pub main_text: String,
}

impl ExtractionRecord {
    /// Minimal rejected record used when extraction fails.
    pub fn fallback(reference: &str, main_text: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            website: reference.to_string(),
            source_url: reference.to_string(),
            summary: String::new(),
            features: Vec::new(),
            pricing: None,
            target_audience: None,
            tags: Vec::new(),
            classification: Classification::Rejected,
            publish_date: None,
            main_text: main_text.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.classification.is_accepted()
    }

    /// Case-insensitive identity used for deduplication.
    pub fn dedup_key(&self) -> (String, String) {
        (self.website.to_lowercase(), self.title.to_lowercase())
    }
}
