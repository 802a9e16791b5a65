//! Candidate discovery through web search.

pub mod aggregator;
pub mod filter;
pub mod serpapi;
pub mod serper;

pub use aggregator::SearchAggregator;
pub use filter::{normalize_url, AggregatorFilter};
pub use serpapi::SerpApiSearcher;
pub use serper::SerperSearcher;
