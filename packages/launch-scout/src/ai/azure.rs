//! Azure OpenAI implementation of [`InferenceClient`].

use std::time::Duration;

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};
use tracing::debug;

use crate::error::{InferenceError, InferenceResult};
use crate::security::AzureCredentials;
use crate::traits::inference::{InferenceClient, InferenceRequest};

const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 800;

/// Chat completions against one Azure OpenAI deployment.
pub struct AzureInference {
    client: OpenAIClient,
    deployment: String,
    temperature: f32,
    max_tokens: u32,
}

impl AzureInference {
    pub fn new(credentials: &AzureCredentials) -> Self {
        let client = OpenAIClient::azure(
            &credentials.endpoint,
            credentials.api_key.expose(),
            &credentials.deployment,
            credentials.api_version.clone(),
        );

        Self {
            client,
            deployment: credentials.deployment.clone(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Per-request timeout. A timed-out call is an [`InferenceError::Service`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    /// Use a custom OpenAI client (e.g. one pointing at a proxy).
    pub fn with_client(mut self, client: OpenAIClient) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl InferenceClient for AzureInference {
    async fn complete(&self, request: &InferenceRequest) -> InferenceResult<String> {
        let chat = ChatRequest::new(&self.deployment)
            .message(Message::system(&request.system))
            .message(Message::user(&request.user))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        let response = self.client.chat_completion(chat).await.map_err(map_error)?;

        if let Some(usage) = &response.usage {
            debug!(
                url = %request.reference,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Inference usage"
            );
        }

        Ok(response.content)
    }
}

fn map_error(e: OpenAIError) -> InferenceError {
    match e {
        OpenAIError::RateLimited(body) => InferenceError::RateLimited(body),
        other => InferenceError::Service(other.to_string()),
    }
}
