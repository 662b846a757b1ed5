//! Order payloads returned to the storefront.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checkout::{CustomerDetails, ShippingDetails};

/// Order fulfilment status for API responses.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `mercato-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Payment status for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: rust_decimal::Decimal,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub payment_session_id: String,
    pub user_id: Option<String>,
    pub line_items: Vec<LineItemResponse>,
    pub total_amount: rust_decimal::Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Option<ShippingDetails>,
    pub customer_info: Option<CustomerDetails>,
    /// Unix timestamp of when the order was created.
    pub created_at: i64,
    /// Unix timestamp of the last update.
    pub updated_at: i64,
}

/// Outcome reported to the browser after the checkout redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    /// The order exists.
    Confirmed,
    /// The order is not visible yet; the client should check back.
    Processing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfirmation {
    pub status: ConfirmationStatus,
    /// Whether this request created the order.
    pub created: bool,
    pub order: Option<OrderResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckoutConfirmation {
    pub fn confirmed(order: OrderResponse, created: bool) -> Self {
        Self {
            status: ConfirmationStatus::Confirmed,
            created,
            order: Some(order),
            message: None,
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            status: ConfirmationStatus::Processing,
            created: false,
            order: None,
            message: Some(message.into()),
        }
    }
}

/// Acknowledgement body returned to the provider for a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self {
            received: true,
            created: None,
            order_id: None,
        }
    }

    pub fn order(order_id: Uuid, created: bool) -> Self {
        Self {
            received: true,
            created: Some(created),
            order_id: Some(order_id),
        }
    }
}
