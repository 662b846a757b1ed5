//! ConfirmationMailer processor.
//!
//! The ConfirmationMailer is responsible for:
//! - Receiving `OrderConfirmation`s from the queue
//! - Rendering the confirmation message
//! - POSTing it to the configured mail relay
//! - Retrying failed deliveries with exponential backoff (2^0 to 2^6 seconds)
//!
//! Delivery state is not persisted. A confirmation that exhausts its retries,
//! or is still in flight at shutdown, is dropped with a log line.

use super::{ConfirmationReceiver, OrderConfirmation};
use crate::config::MailConfig;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Maximum backoff exponent (2^6 = 64 seconds max backoff)
const MAX_RETRY_EXPONENT: u32 = 6;

/// Delivery attempts per confirmation, including the first.
const MAX_ATTEMPTS: u32 = 5;

/// Errors that can occur during mail delivery.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The relay answered with a non-2xx status
    #[error("mail delivery failed with status {status}: {body}")]
    DeliveryFailed { status: u16, body: String },
}

/// Request body understood by the mail relay.
#[derive(Debug, Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
    order_id: Uuid,
    total_amount: String,
}

/// ConfirmationMailer drains the confirmation queue into the mail relay.
pub struct ConfirmationMailer {
    config: MailConfig,
    confirmation_rx: ConfirmationReceiver,
    shutdown_rx: watch::Receiver<bool>,
    http_client: reqwest::Client,
}

impl ConfirmationMailer {
    /// Create a new ConfirmationMailer.
    ///
    /// # Arguments
    ///
    /// * `config` - Mail relay endpoint and credentials
    /// * `confirmation_rx` - Receiver for OrderConfirmation events
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(
        config: MailConfig,
        confirmation_rx: ConfirmationReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            confirmation_rx,
            shutdown_rx,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Run the ConfirmationMailer.
    pub async fn run(mut self) {
        info!("ConfirmationMailer started");

        let mut deliveries = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                // Check for shutdown
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("ConfirmationMailer received shutdown signal");
                        break;
                    }
                }

                // Reap finished deliveries
                Some(_) = deliveries.join_next(), if !deliveries.is_empty() => {}

                Some(confirmation) = self.confirmation_rx.recv() => {
                    debug!(order_id = %confirmation.order_id, "Received OrderConfirmation");
                    deliveries.spawn(deliver_with_retry(
                        self.http_client.clone(),
                        self.config.clone(),
                        confirmation,
                    ));
                }

                else => {
                    info!("OrderConfirmation channel closed");
                    break;
                }
            }
        }

        if !deliveries.is_empty() {
            warn!(
                pending = deliveries.len(),
                "Dropping in-flight confirmation deliveries"
            );
        }
        deliveries.shutdown().await;

        info!("ConfirmationMailer shutdown complete");
    }
}

/// Deliver one confirmation, backing off between failed attempts.
async fn deliver_with_retry(
    http_client: reqwest::Client,
    config: MailConfig,
    confirmation: OrderConfirmation,
) {
    for attempt in 0..MAX_ATTEMPTS {
        match deliver(&http_client, &config, &confirmation).await {
            Ok(()) => {
                info!(
                    order_id = %confirmation.order_id,
                    attempt = attempt + 1,
                    "Order confirmation delivered"
                );
                return;
            }
            Err(e) => {
                warn!(
                    order_id = %confirmation.order_id,
                    error = %e,
                    attempt = attempt + 1,
                    "Order confirmation delivery failed"
                );
                if attempt + 1 < MAX_ATTEMPTS {
                    tokio::time::sleep(calculate_retry_delay(attempt)).await;
                }
            }
        }
    }

    error!(
        order_id = %confirmation.order_id,
        attempts = MAX_ATTEMPTS,
        "Giving up on order confirmation"
    );
}

/// Send the mail relay HTTP request.
async fn deliver(
    http_client: &reqwest::Client,
    config: &MailConfig,
    confirmation: &OrderConfirmation,
) -> Result<(), MailError> {
    let message = MailMessage {
        from: &config.from,
        to: &confirmation.recipient,
        subject: format!("Your order {} is confirmed", confirmation.order_id),
        text: render_text(confirmation),
        order_id: confirmation.order_id,
        total_amount: confirmation.total_amount.to_string(),
    };

    let response = http_client
        .post(config.endpoint.clone())
        .bearer_auth(&config.api_key)
        .json(&message)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(MailError::DeliveryFailed {
            status: status.as_u16(),
            body,
        })
    }
}

/// Plain-text body listing every line item and the total.
pub fn render_text(confirmation: &OrderConfirmation) -> String {
    let mut text = format!(
        "Thank you for your order!\n\nOrder: {}\n\n",
        confirmation.order_id
    );
    for item in &confirmation.line_items {
        text.push_str(&format!(
            "{} x {} @ {} = {}\n",
            item.quantity,
            item.name,
            item.unit_price,
            item.subtotal()
        ));
    }
    text.push_str(&format!("\nTotal: {}\n", confirmation.total_amount));
    text
}

/// Calculate the next retry delay based on the failed attempt number.
///
/// Uses exponential backoff: 2^attempt seconds.
pub fn calculate_retry_delay(attempt: u32) -> std::time::Duration {
    let seconds = 2u64.pow(attempt.min(MAX_RETRY_EXPONENT));
    std::time::Duration::from_secs(seconds)
}
