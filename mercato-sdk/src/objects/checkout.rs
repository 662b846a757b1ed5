//! Checkout session as reported by the payment provider.
//!
//! Only the fields the order flow reads are modelled; unknown fields are
//! ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key holding the serialized `[{productId, quantity}]` list.
pub const ITEMS_METADATA_KEY: &str = "items";

/// Metadata key holding the purchasing user's id.
pub const USER_ID_METADATA_KEY: &str = "userId";

/// A provider checkout session (`object: "checkout.session"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub payment_status: SessionPaymentStatus,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    /// Shipping block on older API versions.
    #[serde(default)]
    pub shipping_details: Option<ShippingDetails>,
    /// Shipping block on newer API versions.
    #[serde(default)]
    pub collected_information: Option<CollectedInformation>,
    /// Total charged, in the currency's smallest unit.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CheckoutSession {
    /// Whether the provider considers the session settled.
    ///
    /// Sessions fully covered by a discount report `no_payment_required`
    /// and are treated like paid ones.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.payment_status,
            SessionPaymentStatus::Paid | SessionPaymentStatus::NoPaymentRequired
        )
    }

    /// Shipping details regardless of which API version delivered them.
    pub fn shipping(&self) -> Option<&ShippingDetails> {
        self.collected_information
            .as_ref()
            .and_then(|c| c.shipping_details.as_ref())
            .or(self.shipping_details.as_ref())
    }

    /// The purchasing user, from metadata or the client reference id.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .get(USER_ID_METADATA_KEY)
            .map(String::as_str)
            .or(self.client_reference_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// The raw serialized line-item list, if present.
    pub fn items_metadata(&self) -> Option<&str> {
        self.metadata.get(ITEMS_METADATA_KEY).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedInformation {
    #[serde(default)]
    pub shipping_details: Option<ShippingDetails>,
}

/// Customer block of a checkout session, copied verbatim onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Shipping block of a checkout session, copied verbatim onto the order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}
