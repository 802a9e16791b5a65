//! Inference service abstraction.

use async_trait::async_trait;

use crate::error::InferenceResult;

/// One role-tagged completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// URL the prompt was built from.
    pub reference: String,
    pub system: String,
    pub user: String,
}

/// Capability: turn a prompt into a single text completion.
///
/// Implementations must report throttling as
/// [`InferenceError::RateLimited`](crate::error::InferenceError::RateLimited);
/// every other failure is treated as permanent.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, request: &InferenceRequest) -> InferenceResult<String>;
}
