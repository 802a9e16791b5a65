//! Page retrieval: consent checks, resilient single fetches, batching.

pub mod batch;
pub mod fetcher;
pub mod http;
pub mod robots;

pub use batch::{BatchFetchCoordinator, BatchFetchReport};
pub use fetcher::ResilientFetcher;
pub use http::ReqwestTransport;
pub use robots::{ConsentChecker, RobotsTxt};
