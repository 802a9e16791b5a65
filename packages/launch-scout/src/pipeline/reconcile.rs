//! Post-extraction reconciliation: classification, dedup, recency.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::types::record::ExtractionRecord;

/// Keep only records classified as accepted.
pub fn retain_accepted(records: Vec<ExtractionRecord>) -> Vec<ExtractionRecord> {
    records.into_iter().filter(|r| r.is_accepted()).collect()
}

/// Collapse records with the same lower-cased (website, title), keeping
/// the first occurrence and the original order.
pub fn dedup_records(records: Vec<ExtractionRecord>) -> Vec<ExtractionRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}

/// Parse a self-reported publish date.
///
/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339, and naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` (assumed UTC).
pub fn parse_publish_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Drop records whose publish date parses and is strictly older than
/// `now - window`. Missing and unparseable dates are kept.
pub fn filter_recent(
    records: Vec<ExtractionRecord>,
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<ExtractionRecord> {
    let cutoff = now - window;
    records
        .into_iter()
        .filter(|record| {
            let Some(raw) = record.publish_date.as_deref() else {
                return true;
            };
            match parse_publish_date(raw) {
                Some(published) if published < cutoff => {
                    debug!(title = %record.title, publish_date = %raw, "Dropping stale record");
                    false
                }
                Some(_) => true,
                None => {
                    debug!(title = %record.title, publish_date = %raw, "Unparseable publish date, keeping");
                    true
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::types::record::Classification;

    fn record(website: &str, title: &str) -> ExtractionRecord {
        let mut r = ExtractionRecord::fallback(website, "");
        r.title = title.to_string();
        r.classification = Classification::Accepted;
        r
    }

    fn dated(date: Option<&str>) -> ExtractionRecord {
        let mut r = record("https://a.io", "A");
        r.publish_date = date.map(str::to_string);
        r
    }

    #[test]
    fn test_retain_accepted() {
        let mut rejected = record("https://b.io", "B");
        rejected.classification = Classification::Rejected;

        let kept = retain_accepted(vec![record("https://a.io", "A"), rejected]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "A");
    }

    #[test]
    fn test_dedup_first_wins() {
        let mut first = record("https://Tool.ai", "Tool");
        first.summary = "first".into();
        let mut dup = record("https://tool.AI", "TOOL");
        dup.summary = "second".into();

        let out = dedup_records(vec![first, record("https://b.io", "B"), dup]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].summary, "first");
        assert_eq!(out[1].title, "B");
    }

    #[test]
    fn test_same_title_different_site_kept() {
        let out = dedup_records(vec![record("https://a.io", "X"), record("https://b.io", "X")]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_parse_publish_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2026, 10, 12, 0, 0, 0).unwrap();

        assert_eq!(parse_publish_date("2026-10-12"), Some(midnight));
        assert_eq!(parse_publish_date("2026-10-12T00:00:00Z"), Some(midnight));
        assert_eq!(parse_publish_date("2026-10-12T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_publish_date("2026-10-12T00:00:00"), Some(midnight));
        assert_eq!(parse_publish_date("2026-10-12T00:00:00.000"), Some(midnight));
        assert_eq!(parse_publish_date("last Tuesday"), None);
        assert_eq!(parse_publish_date("12/10/2026"), None);
    }

    #[test]
    fn test_recency_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let window = Duration::days(7);
        let stale = (now - window - Duration::seconds(1)).to_rfc3339();
        let boundary = (now - window).to_rfc3339();
        let fresh = "2026-10-18";

        let out = filter_recent(
            vec![
                dated(Some(&stale)),
                dated(Some(&boundary)),
                dated(Some(fresh)),
                dated(None),
                dated(Some("soon")),
            ],
            now,
            window,
        );

        let dates: Vec<_> = out.iter().map(|r| r.publish_date.clone()).collect();
        assert_eq!(
            dates,
            vec![
                Some(boundary),
                Some(fresh.to_string()),
                None,
                Some("soon".to_string()),
            ]
        );
    }
}
