//! Aggregator filtering and URL normalization for search candidates.

use url::Url;

/// Hosts whose pages are never useful launch candidates: social networks,
/// news outlets, review sites, marketplaces, search engines, crowdfunding,
/// wikis, code hosts, and institutional TLDs.
///
/// Entries starting with `.` match any host ending in that suffix; other
/// entries match the exact host or any of its subdomains.
pub const DEFAULT_AGGREGATOR_DOMAINS: &[&str] = &[
    "youtube.com", "youtu.be", "reddit.com", "linkedin.com", "facebook.com", "twitter.com", "x.com",
    "tiktok.com", "instagram.com", "pinterest.com", "discord.com", "slack.com", "telegram.org",
    "msn.com", "yahoo.com", "cnn.com", "bbc.com", "reuters.com", "bloomberg.com", "forbes.com",
    "techcrunch.com", "venturebeat.com", "theverge.com", "wired.com", "cnbc.com", "marketwatch.com",
    "forum.freecodecamp.org", "futuretools.io", "aitools.fyi", "toolify.ai", "toolsai.io",
    "g2.com", "capterra.com", "getapp.com", "alternativeto.net", "slant.co", "trustpilot.com",
    "fiverr.com", "upwork.com", "freelancer.com", "indeed.com", "glassdoor.com", "monster.com",
    "amazon.com", "aliexpress.com", "ebay.com", "apple.com", "itunes.apple.com",
    "gov.uk", "gov.in", "gov.au", "gov.ca", "gov.us", "gov.sg", ".edu", "ac.uk", "ac.in",
    "google.com", "bing.com", "duckduckgo.com", "serper.dev", "serpapi.com",
    "patreon.com", "kickstarter.com", "indiegogo.com", "gofundme.com",
    "change.org", "avaaz.org",
    "eventbrite.com", "meetup.com", "eventful.com", "ticketmaster.com",
    "soundcloud.com", "spotify.com",
    "archive.org", "waybackmachine.org",
    "wikipedia.org", "wikidata.org", "wikimedia.org",
    "quora.com", "stackexchange.com", "stackoverflow.com",
    "github.com", "gitlab.com", "bitbucket.org",
    "notion.so", "airtable.com", "asana.com", "trello.com",
    "mailchi.mp", "mailchimp.com", "sendgrid.com", "constantcontact.com",
    "dribbble.com", "behance.net",
    "craigslist.org",
    "medium.com", "substack.com", "news.ycombinator.com", "hackernews.com", "hacker-news.com",
];

/// Drops candidates hosted on aggregator domains.
#[derive(Debug, Clone)]
pub struct AggregatorFilter {
    entries: Vec<String>,
}

impl Default for AggregatorFilter {
    fn default() -> Self {
        Self::new(DEFAULT_AGGREGATOR_DOMAINS.iter().copied())
    }
}

impl AggregatorFilter {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Whether `url` belongs to an aggregator. URLs without a parseable
    /// host are treated as aggregators.
    pub fn is_aggregator(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        else {
            return true;
        };

        self.entries.iter().any(|entry| {
            if entry.starts_with('.') {
                host.ends_with(entry.as_str())
            } else {
                host == *entry
                    || host
                        .strip_suffix(entry.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        })
    }
}

/// Scheme, host, port and path only. Query and fragment are dropped so
/// candidates dedup regardless of tracking parameters.
///
/// Unparseable input is returned unchanged.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        assert_eq!(normalize_url("https://x.com/a?b=1#frag"), normalize_url("https://x.com/a"));
        assert_eq!(normalize_url("https://x.com/a?b=1#frag"), "https://x.com/a");
        assert_eq!(normalize_url("HTTPS://Tool.AI/Launch?utm=1"), "https://tool.ai/Launch");
    }

    #[test]
    fn test_tld_suffix_entry() {
        let filter = AggregatorFilter::new([".edu"]);

        assert!(filter.is_aggregator("https://foo.edu/page"));
        assert!(filter.is_aggregator("https://bar.foo.edu/"));
        assert!(!filter.is_aggregator("https://education.com/"));
    }

    #[test]
    fn test_domain_entry_matches_subdomains_only() {
        let filter = AggregatorFilter::new(["x.com"]);

        assert!(filter.is_aggregator("https://x.com/post"));
        assert!(filter.is_aggregator("https://m.x.com/post"));
        assert!(!filter.is_aggregator("https://box.com/"));
        assert!(!filter.is_aggregator("https://x.com.evil.io/"));
    }

    #[test]
    fn test_unparseable_is_aggregator() {
        let filter = AggregatorFilter::default();

        assert!(filter.is_aggregator("not a url"));
        assert!(filter.is_aggregator("mailto:someone@example.com"));
    }

    #[test]
    fn test_default_list() {
        let filter = AggregatorFilter::default();

        assert!(filter.is_aggregator("https://www.youtube.com/watch?v=1"));
        assert!(filter.is_aggregator("https://mit.edu/"));
        assert!(filter.is_aggregator("https://www.gov.uk/"));
        assert!(filter.is_aggregator("https://GoFundMe.com/f/x"));
        assert!(!filter.is_aggregator("https://newtool.ai/"));
    }
}
