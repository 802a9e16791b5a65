//! Search queries with a recency bound.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Broad launch-discovery queries issued on every run.
pub const BASE_QUERIES: [&str; 6] = [
    r#""launched new AI tool" OR "released new AI tool" OR "announced new AI tool" OR "introducing new AI tool" OR "AI tool just launched" OR "new AI tool released" OR "AI tool now available" OR "new AI tool available" OR "AI tool beta launch" OR "AI tool preview launch" OR "AI tool demo launch""#,
    r#""AI app" OR "AI platform" OR "AI product" OR "AI startup" OR "AI SaaS" OR "AI-powered""#,
    r#""AI tool update" OR "AI tool integration" OR "AI tool feature" OR "AI tool partnership" OR "AI tool API" OR "AI tool SaaS" OR "AI tool for" OR "AI-powered tool""#,
    r#""AI tool directory" OR "AI marketplace" OR "AI website""#,
    r#""new from" OR "just released" OR "now available" OR "new AI software launch" OR "new AI app launch" OR "AI tool free launch" OR "AI tool open source launch""#,
    "site:.com OR site:.io OR site:.ai OR site:.co OR site:.app OR site:.dev OR site:.tech OR site:.org",
];

/// A query string plus the earliest publication date of interest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub since: NaiveDate,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, since: NaiveDate) -> Self {
        Self {
            text: text.into(),
            since,
        }
    }

    /// Query string as sent to a search backend.
    pub fn render(&self) -> String {
        format!("{} after:{}", self.text, self.since.format("%Y-%m-%d"))
    }
}

/// The default query set, bounded to the `window` before `now`.
pub fn default_queries(now: DateTime<Utc>, window: Duration) -> Vec<SearchQuery> {
    let since = (now - window).date_naive();
    BASE_QUERIES
        .iter()
        .map(|text| SearchQuery::new(*text, since))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_appends_after() {
        let since = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let query = SearchQuery::new("\"AI app\"", since);

        assert_eq!(query.render(), "\"AI app\" after:2026-03-01");
    }

    #[test]
    fn test_default_queries_use_window() {
        let now = Utc.with_ymd_and_hms(2026, 3, 8, 12, 0, 0).unwrap();
        let queries = default_queries(now, Duration::days(7));

        assert_eq!(queries.len(), 6);
        assert!(queries
            .iter()
            .all(|q| q.since == NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
        assert!(queries[5].render().starts_with("site:.com"));
    }
}
