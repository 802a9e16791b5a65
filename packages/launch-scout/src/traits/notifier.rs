//! Outbound notification channel.

use async_trait::async_trait;

use crate::error::NotifyError;

/// Delivery target for formatted record cards.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one text payload. Returns the HTTP status reported by the target.
    async fn notify(&self, payload: &str) -> Result<u16, NotifyError>;
}
