//! Lenient parsing of extraction completions.
//!
//! Models wrap JSON in code fences, add prose around it, use either the
//! prompt's title-case keys or snake_case, and put strings where lists
//! belong. All of that is accepted here.

use serde_json::{Map, Value};

use crate::error::ExtractionError;
use crate::types::record::{Classification, ExtractionRecord};

/// Locate the JSON object inside a completion.
///
/// Strips a surrounding code fence (with or without a language tag), then
/// takes everything from the first `{` to the last `}`.
pub fn extract_json_object(completion: &str) -> Option<&str> {
    let mut text = completion.trim();

    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        // Skip the language identifier line, if any
        let body = match after.find('\n') {
            Some(newline) if !after[..newline].contains('{') => &after[newline + 1..],
            _ => after,
        };
        text = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Key spellings per field, in lookup order. The prompt's title-case key
/// comes first; a completion may carry several spellings at once.
const TITLE: &[&str] = &["Title", "title"];
const WEBSITE: &[&str] = &["Website", "website"];
const SOURCE_URL: &[&str] = &["Source URL", "source_url", "source"];
const CORE_FUNCTIONALITY: &[&str] = &["Core Functionality", "core_functionality"];
const SUMMARY: &[&str] = &["Summary", "summary"];
const FEATURES: &[&str] = &["Key Features", "features"];
const PRICING: &[&str] = &["Pricing", "pricing"];
const TARGET_AUDIENCE: &[&str] = &["Target Audience", "target_audience"];
const TAGS: &[&str] = &["Tags", "tags"];
const CLASSIFICATION: &[&str] = &["ai_tool_annotation", "classification"];
const PUBLISH_DATE: &[&str] = &["Publish Date", "publish_date"];

/// Completion object with loosely typed values.
struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// First spelling present with a non-null value.
    fn field(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !value.is_null())
    }
}

/// Parse a completion into a record for `reference`.
pub fn parse_record(
    completion: &str,
    reference: &str,
    main_text: &str,
) -> Result<ExtractionRecord, ExtractionError> {
    let json = extract_json_object(completion).ok_or_else(|| ExtractionError::NonJson {
        url: reference.to_string(),
    })?;

    let raw = serde_json::from_str::<Map<String, Value>>(json)
        .map(RawRecord)
        .map_err(|e| ExtractionError::Parse {
            url: reference.to_string(),
            reason: e.to_string(),
        })?;

    let summary = text(raw.field(CORE_FUNCTIONALITY))
        .or_else(|| text(raw.field(SUMMARY)))
        .unwrap_or_default();

    Ok(ExtractionRecord {
        title: text(raw.field(TITLE)).unwrap_or_default(),
        website: text(raw.field(WEBSITE)).unwrap_or_else(|| reference.to_string()),
        source_url: text(raw.field(SOURCE_URL)).unwrap_or_else(|| reference.to_string()),
        summary,
        features: list(raw.field(FEATURES)),
        pricing: text(raw.field(PRICING)),
        target_audience: text(raw.field(TARGET_AUDIENCE)),
        tags: list(raw.field(TAGS)),
        classification: Classification::from_label(text(raw.field(CLASSIFICATION)).as_deref()),
        publish_date: text(raw.field(PUBLISH_DATE)),
        main_text: main_text.to_string(),
    })
}

/// Non-empty trimmed text. Numbers and booleans are stringified.
fn text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// A list of strings, accepting a bare string as a one-element list.
fn list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| text(Some(v))).collect(),
        Some(other) => text(Some(other)).into_iter().collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_object(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_fenced_object() {
        let completion = "```json\n{\"Title\": \"Tool\"}\n```";
        assert_eq!(extract_json_object(completion), Some("{\"Title\": \"Tool\"}"));

        let bare_fence = "```\n{\"Title\": \"Tool\"}\n```";
        assert_eq!(extract_json_object(bare_fence), Some("{\"Title\": \"Tool\"}"));
    }

    #[test]
    fn test_extract_with_prose() {
        let completion = "Here is the record:\n{\"Title\": \"Tool\", \"Tags\": {\"x\": 1}}\nHope it helps.";
        assert_eq!(
            extract_json_object(completion),
            Some("{\"Title\": \"Tool\", \"Tags\": {\"x\": 1}}")
        );
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json_object("I cannot help with that."), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_title_case_keys() {
        let completion = r#"```json
{
    "Title": "Scribe",
    "Website": "https://scribe.ai",
    "Source URL": "https://news.io/scribe",
    "Core Functionality": "Writes docs.",
    "Key Features": ["Autocomplete", "Templates"],
    "Pricing": "Free tier",
    "Target Audience": "Engineers",
    "Tags": ["docs", "ai"],
    "ai_tool_annotation": "ai_tool",
    "Publish Date": "2026-10-15"
}
```"#;

        let record = parse_record(completion, "https://news.io/scribe", "html").unwrap();

        assert_eq!(record.title, "Scribe");
        assert_eq!(record.website, "https://scribe.ai");
        assert_eq!(record.source_url, "https://news.io/scribe");
        assert_eq!(record.summary, "Writes docs.");
        assert_eq!(record.features, vec!["Autocomplete", "Templates"]);
        assert_eq!(record.pricing.as_deref(), Some("Free tier"));
        assert_eq!(record.tags, vec!["docs", "ai"]);
        assert!(record.is_accepted());
        assert_eq!(record.publish_date.as_deref(), Some("2026-10-15"));
        assert_eq!(record.main_text, "html");
    }

    #[test]
    fn test_parse_defaults() {
        let completion = r#"{"title": "Thing", "Summary": "Fallback summary", "Key Features": "One feature", "Pricing": null}"#;

        let record = parse_record(completion, "https://thing.io/", "").unwrap();

        assert_eq!(record.website, "https://thing.io/");
        assert_eq!(record.source_url, "https://thing.io/");
        assert_eq!(record.summary, "Fallback summary");
        assert_eq!(record.features, vec!["One feature"]);
        assert_eq!(record.pricing, None);
        assert_eq!(record.classification, Classification::Rejected);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_record("no json here", "https://a.io/", ""),
            Err(ExtractionError::NonJson { .. })
        ));
        assert!(matches!(
            parse_record("{not: valid}", "https://a.io/", ""),
            Err(ExtractionError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_both_key_spellings() {
        let completion = r#"{
            "Title": "Tool",
            "title": "Tool (dup)",
            "Source URL": "https://news.io/tool",
            "source": "https://other.io/",
            "Pricing": null,
            "pricing": "Free",
            "ai_tool_annotation": "ai_tool",
            "classification": "accepted"
        }"#;

        let record = parse_record(completion, "https://tool.ai/", "").unwrap();

        assert_eq!(record.title, "Tool");
        assert_eq!(record.source_url, "https://news.io/tool");
        assert_eq!(record.pricing.as_deref(), Some("Free"));
        assert!(record.is_accepted());
    }
}
