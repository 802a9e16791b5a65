//! Concurrency-capped extraction calls with rate-limit retry.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::ai::parse::parse_record;
use crate::ai::prompts::{user_prompt, SYSTEM_PROMPT};
use crate::error::{ExtractionError, InferenceError};
use crate::traits::inference::{InferenceClient, InferenceRequest};
use crate::types::config::InferenceConfig;
use crate::types::record::ExtractionRecord;

/// Result of one extraction. Always carries a record; `error` is set when
/// the record is the rejected fallback.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub record: ExtractionRecord,
    pub error: Option<ExtractionError>,
}

impl Extracted {
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Gates every inference call behind one semaphore, independent of how
/// many pages are fetched at once.
pub struct ExtractionThrottler {
    client: Arc<dyn InferenceClient>,
    permits: Semaphore,
    config: InferenceConfig,
}

impl ExtractionThrottler {
    pub fn new(client: Arc<dyn InferenceClient>, config: InferenceConfig) -> Self {
        Self {
            client,
            permits: Semaphore::new(config.concurrency.max(1)),
            config,
        }
    }

    /// Extract a record from `body`, fetched from `reference`. Never fails.
    pub async fn extract(&self, body: &str, reference: &str) -> Extracted {
        let main_text = self.truncate(body, reference);

        match self.extract_record(&main_text, reference).await {
            Ok(record) => {
                info!(
                    url = %reference,
                    title = %record.title,
                    website = %record.website,
                    classification = ?record.classification,
                    "Extracted record"
                );
                Extracted {
                    record,
                    error: None,
                }
            }
            Err(e) => {
                error!(url = %reference, error = %e, "Extraction failed, using fallback record");
                Extracted {
                    record: ExtractionRecord::fallback(reference, main_text),
                    error: Some(e),
                }
            }
        }
    }

    async fn extract_record(
        &self,
        main_text: &str,
        reference: &str,
    ) -> Result<ExtractionRecord, ExtractionError> {
        let request = InferenceRequest {
            reference: reference.to_string(),
            system: SYSTEM_PROMPT.to_string(),
            user: user_prompt(reference, main_text),
        };

        let completion = self.complete_with_retry(&request).await?;
        parse_record(&completion, reference, main_text)
    }

    /// One permit per attempt; the permit is released before sleeping.
    async fn complete_with_retry(
        &self,
        request: &InferenceRequest,
    ) -> Result<String, ExtractionError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let result = {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|_| ExtractionError::LimiterClosed)?;
                let limit = self.config.request_timeout;
                tokio::time::timeout(limit, self.client.complete(request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(InferenceError::Service(format!(
                            "no completion within {limit:?}"
                        )))
                    })
            };

            match result {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_rate_limited() && attempt + 1 < attempts => {
                    let delay = self.config.rate_limit_backoff.delay(attempt);
                    warn!(
                        url = %request.reference,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        "Inference rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(ExtractionError::Inference {
                        url: request.reference.clone(),
                        source,
                    })
                }
            }
        }
    }

    /// Cap page text at the configured number of characters.
    fn truncate(&self, body: &str, reference: &str) -> String {
        let limit = self.config.truncation_limit;
        match body.char_indices().nth(limit) {
            Some((cut, _)) => {
                warn!(url = %reference, limit, "Page truncated for extraction prompt");
                body[..cut].to_string()
            }
            None => body.to_string(),
        }
    }
}
