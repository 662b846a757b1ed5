//! Application state shared across all request handlers.

use crate::config::runtime::{SharedConfig, StripeConfig};
use mercato_core::notify::Notifier;
use mercato_core::orders::OrderCreator;
use mercato_core::providers::{SessionSource, StripeClient};
use mercato_core::store::{OrderStore, ProductStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Order persistence, unique by payment session id.
    pub orders: Arc<dyn OrderStore>,
    /// Creates orders from paid sessions exactly once.
    pub creator: OrderCreator,
    /// Provider session lookup, present only when an API key is configured.
    /// Rebuilt on SIGHUP.
    pub sessions: Arc<RwLock<Option<Arc<dyn SessionSource>>>>,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        notifier: Arc<dyn Notifier>,
        sessions: Option<Arc<dyn SessionSource>>,
        config: SharedConfig,
    ) -> Self {
        Self {
            creator: OrderCreator::new(orders.clone(), products, notifier),
            orders,
            sessions: Arc::new(RwLock::new(sessions)),
            config,
        }
    }

    /// The current provider session client, if any.
    pub async fn session_source(&self) -> Option<Arc<dyn SessionSource>> {
        self.sessions.read().await.clone()
    }
}

/// Build the provider session client for `config`, or `None` when no
/// secret key is configured.
pub fn session_source_for(config: &StripeConfig) -> Option<Arc<dyn SessionSource>> {
    let secret_key = config.secret_key.as_ref()?;
    Some(Arc::new(StripeClient::new(
        config.api_base.clone(),
        secret_key.clone(),
    )))
}
