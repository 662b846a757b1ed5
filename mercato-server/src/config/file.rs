//! TOML file configuration structures.
//!
//! These structs directly map to the `mercato-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    /// Mail relay. Without it confirmations are only logged.
    #[serde(default)]
    pub mail: Option<MailConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Header set by the upstream auth layer carrying the caller's user id.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            identity_header: default_identity_header(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_identity_header() -> String {
    mercato_core::config::DEFAULT_IDENTITY_HEADER.to_string()
}

/// Payment provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Webhook endpoint secret (`whsec_...`).
    pub webhook_secret: String,
    /// Secret API key (`sk_...`), used to retrieve sessions on checkout success.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// API base URL; the public endpoint when unset.
    #[serde(default)]
    pub api_base: Option<Url>,
    /// Maximum accepted age of a webhook signature, in seconds.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u32,
}

fn default_tolerance_secs() -> u32 {
    mercato_sdk::signature::DEFAULT_TOLERANCE as u32
}

/// Checkout-success waiting section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// How long the success handler waits for the webhook's order.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// How often the store is polled while waiting.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: default_wait_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_wait_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// Mail relay section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub endpoint: Url,
    pub api_key: String,
    pub from: String,
}
