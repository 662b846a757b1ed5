//! Payment provider configuration.

use url::Url;

/// Default base URL of the provider REST API.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Endpoint secret used to verify `Stripe-Signature` headers.
    pub webhook_secret: Box<[u8]>,
    /// API key for retrieving sessions. Without it the checkout-success
    /// handler can only wait for the webhook.
    pub secret_key: Option<String>,
    pub api_base: Url,
    /// Accepted age of a signed event in seconds. Zero disables the check.
    pub tolerance_secs: i64,
}

impl StripeConfig {
    /// Get the secret key bytes for HMAC verification.
    pub fn webhook_secret_bytes(&self) -> &[u8] {
        &self.webhook_secret
    }
}
