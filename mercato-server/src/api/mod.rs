//! HTTP API.
//!
//! - [`webhook`] receives signed provider events.
//! - [`checkout`] serves the storefront after the checkout redirect.

use axum::{Router, routing::post};
use mercato_core::entities::order_records::OrderRecord;
use mercato_sdk::objects::{LineItemResponse, OrderResponse};

use crate::state::AppState;

mod checkout;
pub mod extractors;
mod webhook;

#[cfg(test)]
mod tests;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhooks/stripe", post(webhook::stripe_webhook))
        .merge(checkout::router())
}

/// Convert an `OrderRecord` (DB model) into an `OrderResponse` (API model).
fn to_response(record: &OrderRecord) -> OrderResponse {
    OrderResponse {
        order_id: record.order_id,
        payment_session_id: record.payment_session_id.clone(),
        user_id: record.user_id.clone(),
        line_items: record
            .line_items
            .iter()
            .map(|item| LineItemResponse {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                name: item.name.clone(),
                image: item.image.clone(),
            })
            .collect(),
        total_amount: record.total_amount,
        status: record.status.into(),
        payment_status: record.payment_status.into(),
        shipping_address: record.shipping_address.clone(),
        customer_info: record.customer_info.clone(),
        created_at: record.created_at.assume_utc().unix_timestamp(),
        updated_at: record.updated_at.assume_utc().unix_timestamp(),
    }
}
