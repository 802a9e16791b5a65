//! Structured extraction through an inference service.

pub mod azure;
pub mod parse;
pub mod prompts;
pub mod throttler;

pub use azure::AzureInference;
pub use throttler::{Extracted, ExtractionThrottler};
