//! Configuration types for Mercato.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod checkout;
mod mail;
mod server;
mod stripe;

pub use checkout::{CheckoutConfig, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
pub use mail::MailConfig;
pub use server::{DEFAULT_IDENTITY_HEADER, ServerConfig};
pub use stripe::{DEFAULT_API_BASE, StripeConfig};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address, identity header).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Payment provider configuration (webhook secret, API access).
    pub stripe: Arc<RwLock<StripeConfig>>,
    /// Checkout-success waiting behaviour.
    pub checkout: Arc<RwLock<CheckoutConfig>>,
}
