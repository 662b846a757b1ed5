//! Session descriptors and line-item metadata parsing.

use mercato_sdk::objects::{CheckoutSession, CustomerDetails, ShippingDetails};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Everything the order creator needs to know about a payment session.
///
/// Built from a provider [`CheckoutSession`], either delivered by a webhook
/// or retrieved on behalf of the checkout-success handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub session_id: String,
    pub user_id: Option<String>,
    /// Raw JSON line-item list from the session metadata.
    pub items_metadata: Option<String>,
    pub shipping: Option<ShippingDetails>,
    pub customer: Option<CustomerDetails>,
}

impl SessionDescriptor {
    /// Fill in the purchasing user when the session did not carry one.
    pub fn with_fallback_user(mut self, user_id: Option<&str>) -> Self {
        if self.user_id.is_none() {
            self.user_id = user_id.filter(|u| !u.is_empty()).map(str::to_owned);
        }
        self
    }

    /// Parse the line-item metadata.
    pub fn requested_items(&self) -> Result<Vec<RequestedItem>, SessionDataError> {
        parse_line_items(self.items_metadata.as_deref())
    }
}

impl From<&CheckoutSession> for SessionDescriptor {
    fn from(session: &CheckoutSession) -> Self {
        Self {
            session_id: session.id.clone(),
            user_id: session.user_id().map(str::to_owned),
            items_metadata: session.items_metadata().map(str::to_owned),
            shipping: session.shipping().cloned(),
            customer: session.customer_details.clone(),
        }
    }
}

/// Largest quantity accepted for a single line item.
pub const MAX_QUANTITY: u32 = 10_000;

/// One `{productId, quantity}` entry of the line-item metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    #[serde(deserialize_with = "product_id_from_string_or_number")]
    pub product_id: String,
    pub quantity: u32,
}

/// Why a session cannot be turned into an order.
#[derive(Debug, Error)]
pub enum SessionDataError {
    #[error("session has no line-item metadata")]
    MissingItems,

    #[error("line-item metadata is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("line-item metadata lists no items")]
    NoItems,

    #[error("product {product_id} has quantity 0")]
    ZeroQuantity { product_id: String },

    #[error("line item has an empty product id")]
    EmptyProductId,

    #[error("product {product_id} has quantity {quantity}, above the limit of {MAX_QUANTITY}")]
    QuantityTooLarge { product_id: String, quantity: u32 },

    #[error("order total {total} exceeds the storable maximum")]
    TotalOutOfRange { total: Decimal },
}

/// Parse the serialized `[{productId, quantity}]` list.
///
/// Every entry must name a product and order between one and
/// [`MAX_QUANTITY`] units; a session
/// that fails here never produces an order.
pub fn parse_line_items(raw: Option<&str>) -> Result<Vec<RequestedItem>, SessionDataError> {
    let raw = raw
        .filter(|r| !r.trim().is_empty())
        .ok_or(SessionDataError::MissingItems)?;
    let items: Vec<RequestedItem> = serde_json::from_str(raw)?;

    if items.is_empty() {
        return Err(SessionDataError::NoItems);
    }
    for item in &items {
        if item.product_id.is_empty() {
            return Err(SessionDataError::EmptyProductId);
        }
        if item.quantity == 0 {
            return Err(SessionDataError::ZeroQuantity {
                product_id: item.product_id.clone(),
            });
        }
        if item.quantity > MAX_QUANTITY {
            return Err(SessionDataError::QuantityTooLarge {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }
    }
    Ok(items)
}

fn product_id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
