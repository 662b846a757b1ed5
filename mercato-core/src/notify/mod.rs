//! Order confirmation notifications.
//!
//! Notifications are best-effort: the order creator hands a confirmation to a
//! [`Notifier`] after the order is persisted and only logs failures. The
//! production notifier pushes onto a bounded channel drained by the
//! [`ConfirmationMailer`], so creation never waits on mail delivery.

pub mod mailer;

pub use mailer::{ConfirmationMailer, MailError};

use crate::entities::order_records::{LineItem, OrderRecord};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;
use uuid::Uuid;

/// Default buffer size for the confirmation channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for order confirmations.
pub type ConfirmationSender = mpsc::Sender<OrderConfirmation>;
/// Receiver handle for order confirmations.
pub type ConfirmationReceiver = mpsc::Receiver<OrderConfirmation>;

/// Create a new confirmation channel.
///
/// Returns a (sender, receiver) pair. The receiver belongs to a single
/// [`ConfirmationMailer`].
pub fn confirmation_channel() -> (ConfirmationSender, ConfirmationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// What the customer is told about a freshly created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub recipient: String,
    pub order_id: Uuid,
    pub payment_session_id: String,
    pub total_amount: Decimal,
    pub line_items: Vec<LineItem>,
}

impl OrderConfirmation {
    /// Build a confirmation for `order`, or `None` if no email was
    /// snapshotted from the session.
    pub fn for_order(order: &OrderRecord) -> Option<Self> {
        let recipient = order.customer_email()?;
        Some(Self {
            recipient: recipient.to_owned(),
            order_id: order.order_id,
            payment_session_id: order.payment_session_id.clone(),
            total_amount: order.total_amount,
            line_items: order.line_items.clone(),
        })
    }
}

/// Errors that can occur when handing off a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification queue is full")]
    QueueFull,
    #[error("notification queue is closed")]
    QueueClosed,
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_confirmed(&self, confirmation: OrderConfirmation) -> Result<(), NotifyError>;
}

/// Queues confirmations for the [`ConfirmationMailer`] without waiting.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: ConfirmationSender,
}

impl ChannelNotifier {
    pub fn new(tx: ConfirmationSender) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn order_confirmed(&self, confirmation: OrderConfirmation) -> Result<(), NotifyError> {
        self.tx.try_send(confirmation).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }
}

/// Used when no mail relay is configured: the confirmation is only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_confirmed(&self, confirmation: OrderConfirmation) -> Result<(), NotifyError> {
        info!(
            order_id = %confirmation.order_id,
            recipient = %confirmation.recipient,
            total = %confirmation.total_amount,
            "Order confirmation not sent: no mail relay configured"
        );
        Ok(())
    }
}
