//! Teams incoming-webhook notifications for accepted records.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::NotifyError;
use crate::security::SecretString;
use crate::traits::notifier::Notifier;
use crate::types::record::ExtractionRecord;

/// Features too vague to be worth showing.
const GENERIC_FEATURES: &[&str] = &[
    "BPO Services",
    "Consultation",
    "Talent Outsourcing",
    "International Logistics BPO",
    "E-Recovery",
    "Process Automation",
    "Services",
];

const NO_PRICING: &str = "No pricing information available.";
const MAX_PRICING_WORDS: usize = 20;
const MAX_OVERVIEW_SENTENCES: usize = 5;
const MAX_OVERVIEW_WORDS: usize = 80;
const FALLBACK_OVERVIEW_CHARS: usize = 300;

/// Posts `{"text": payload}` to a webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: SecretString,
}

#[derive(Serialize)]
struct Payload<'a> {
    text: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, payload: &str) -> Result<u16, NotifyError> {
        let response = self
            .client
            .post(self.url.expose())
            .json(&Payload { text: payload })
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;
        Ok(response.status().as_u16())
    }
}

/// Send one card per record. Failures are logged and never propagate.
///
/// Returns the number of cards the target accepted with HTTP 200.
pub async fn deliver_records(notifier: &dyn Notifier, records: &[ExtractionRecord]) -> usize {
    let mut delivered = 0;
    for (index, record) in records.iter().enumerate() {
        let card = format_record_card(record, index + 1);
        match notifier.notify(&card).await {
            Ok(200) => {
                delivered += 1;
                info!(index = index + 1, title = %record.title, "Notification sent");
            }
            Ok(status) => {
                warn!(index = index + 1, status, "Notification rejected");
            }
            Err(e) => {
                error!(index = index + 1, error = %e, "Notification failed");
            }
        }
    }
    delivered
}

/// Markdown card for one record. `index` is 1-based.
pub fn format_record_card(record: &ExtractionRecord, index: usize) -> String {
    let mut features: Vec<&str> = Vec::new();
    for feature in &record.features {
        let feature = feature.as_str();
        if feature.chars().count() > 5
            && !GENERIC_FEATURES.contains(&feature)
            && !features.contains(&feature)
        {
            features.push(feature);
        }
    }
    let features = if features.is_empty() {
        "N/A".to_string()
    } else {
        features
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let pricing = match record.pricing.as_deref() {
        Some(p) if !p.trim().is_empty() && p.split_whitespace().count() <= MAX_PRICING_WORDS => p,
        _ => NO_PRICING,
    };

    let target = match record.target_audience.as_deref() {
        Some(t) if t.chars().count() >= 3 => t,
        _ => "N/A",
    };

    let website_line = if record.website != record.source_url {
        format!("**🌐 Website:** [{0}]({0})\n\n", record.website)
    } else {
        String::new()
    };

    let title = if record.title.is_empty() { "N/A" } else { record.title.as_str() };

    format!(
        "### 🚀 AI Tool {index}: {title}\n\n\
         {website_line}\
         **🔗 Source:** [{source}]({source})\n\n\
         **🎯 Target Audience / Use Case:** {target}\n\n\
         **📝 Overview:**\n{overview}\n\n\
         **💡 Key Features:**\n{features}\n\n\
         **💲 Pricing:** {pricing}\n\n",
        source = record.source_url,
        overview = overview(record),
    )
}

/// Summary (or the start of the page text), limited to five sentences or
/// eighty words.
fn overview(record: &ExtractionRecord) -> String {
    let text = if record.summary.trim().is_empty() {
        record
            .main_text
            .chars()
            .take(FALLBACK_OVERVIEW_CHARS)
            .collect::<String>()
    } else {
        record.summary.clone()
    };
    let text = text.trim();
    if text.is_empty() {
        return "N/A".to_string();
    }

    let sentences = split_sentences(text);
    if sentences.len() > MAX_OVERVIEW_SENTENCES {
        return sentences[..MAX_OVERVIEW_SENTENCES].join(" ");
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > MAX_OVERVIEW_WORDS {
        return format!("{}...", words[..MAX_OVERVIEW_WORDS].join(" "));
    }

    text.to_string()
}

/// Split after `.`, `!` or `?` followed by spaces. Punctuation stays with
/// its sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let followed_by_space = chars.peek().is_some_and(|&(_, next)| next == ' ');
        if matches!(c, '.' | '!' | '?') && followed_by_space {
            sentences.push(&text[start..=i]);
            while chars.peek().is_some_and(|&(_, next)| next == ' ') {
                chars.next();
            }
            start = chars.peek().map_or(text.len(), |&(j, _)| j);
        }
    }
    sentences.push(&text[start..]);
    sentences
}
