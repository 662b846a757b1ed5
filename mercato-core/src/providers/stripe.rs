use super::{ProviderError, SessionSource};
use async_trait::async_trait;
use mercato_sdk::objects::CheckoutSession;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Retrieves checkout sessions from the Stripe REST API.
pub struct StripeClient {
    api_base: Url,
    secret_key: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl StripeClient {
    /// Create a new StripeClient.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL of the API, e.g. `https://api.stripe.com`
    /// * `secret_key` - Secret API key sent as a bearer token
    pub fn new(api_base: Url, secret_key: String) -> Self {
        Self {
            api_base,
            secret_key,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn session_url(&self, session_id: &str) -> Result<Url, ProviderError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["v1", "checkout", "sessions", session_id]);
        Ok(url)
    }
}

#[async_trait]
impl SessionSource for StripeClient {
    #[tracing::instrument(skip(self), err)]
    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSession>, ProviderError> {
        let url = self.session_url(session_id)?;
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("Provider does not know this session");
            return Ok(None);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_url() {
        let client = StripeClient::new(
            Url::parse("https://api.stripe.com").unwrap(),
            "sk_test".to_string(),
        );
        assert_eq!(
            client.session_url("cs_test_1").unwrap().as_str(),
            "https://api.stripe.com/v1/checkout/sessions/cs_test_1"
        );
    }

    #[test]
    fn test_session_url_keeps_base_path_and_escapes_id() {
        let client = StripeClient::new(
            Url::parse("http://localhost:12111/stripe/").unwrap(),
            "sk_test".to_string(),
        );
        assert_eq!(
            client.session_url("cs/../x").unwrap().as_str(),
            "http://localhost:12111/stripe/v1/checkout/sessions/cs%2F..%2Fx"
        );
    }
}
