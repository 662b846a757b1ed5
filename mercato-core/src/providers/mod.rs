//! Payment provider access.
//!
//! The checkout-success handler asks a [`SessionSource`] for the full session
//! so it can create the order itself instead of waiting for the webhook.

mod stripe;

pub use stripe::StripeClient;

use async_trait::async_trait;
use mercato_sdk::objects::CheckoutSession;
use thiserror::Error;

/// Errors that can occur while talking to the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// API request error
    #[error("API request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid request URL
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimited,

    /// API returned an error
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

/// Read-only lookup of checkout sessions.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Retrieve a session by id. `Ok(None)` when the provider does not know it.
    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSession>, ProviderError>;
}
