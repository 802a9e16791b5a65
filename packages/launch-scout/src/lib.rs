//! Launch discovery pipeline
//!
//! Finds newly launched web products: broad web searches produce candidate
//! URLs, pages are fetched under a per-domain failure blacklist and
//! robots.txt consent, an inference service extracts a structured record
//! from each page, and the records are reconciled (classification filter,
//! dedup, recency filter).
//!
//! # Usage
//!
//! ```rust,ignore
//! use launch_scout::{Pipeline, PipelineConfig, DomainBlacklist, default_queries};
//!
//! let config = PipelineConfig::default();
//! let blacklist = DomainBlacklist::load("data/blacklist.json").shared();
//! let pipeline = Pipeline::new(searchers, transport, inference, blacklist, config.clone());
//!
//! let output = pipeline
//!     .run(&default_queries(chrono::Utc::now(), config.recency_window()))
//!     .await;
//! println!("{}", launch_scout::report::render_records(&output.records));
//! ```
//!
//! # Modules
//!
//! - [`blacklist`] - Durable per-domain failure tracking
//! - [`crawlers`] - Consent checks, resilient fetches, batching
//! - [`search`] - Search backends, aggregation, filtering
//! - [`ai`] - Throttled extraction and completion parsing
//! - [`pipeline`] - Orchestration and reconciliation
//! - [`traits`] - Seams for transport, search, inference, notification
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod blacklist;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod search;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use ai::{AzureInference, Extracted, ExtractionThrottler};
pub use blacklist::{DomainBlacklist, SharedBlacklist};
pub use config::Config;
pub use crawlers::{BatchFetchCoordinator, BatchFetchReport, ConsentChecker, ReqwestTransport, ResilientFetcher};
pub use error::{
    BlacklistError, ConfigError, ExtractionError, FetchError, FetchErrorKind, InferenceError,
    NotifyError, SearchError, TransportError,
};
pub use notify::{format_record_card, WebhookNotifier};
pub use pipeline::{Pipeline, PipelineOutput};
pub use retry::BackoffPolicy;
pub use search::{AggregatorFilter, SearchAggregator, SerpApiSearcher, SerperSearcher};
pub use traits::{
    inference::{InferenceClient, InferenceRequest},
    notifier::Notifier,
    searcher::{SearchResult, WebSearcher},
    transport::{HttpTransport, PageRequest, PageResponse},
};
pub use types::{
    config::{FetchConfig, InferenceConfig, PipelineConfig, SearchConfig},
    fetch::{FetchFailure, FetchOutcome},
    query::{default_queries, SearchQuery},
    record::{Classification, ExtractionRecord},
    summary::RunSummary,
};
