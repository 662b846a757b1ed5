//! Checkout API handlers.
//!
//! These endpoints are called by the storefront after the provider redirects
//! the browser back, and require an identified [`Caller`].
//!
//! # Endpoints
//!
//! - `GET /checkout/success?session_id=…` - confirm (or create) the order
//! - `GET /orders/session/{session_id}`  - look up the order for a session

use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use mercato_core::entities::order_records::OrderRecord;
use mercato_core::orders::SessionDataError;
use mercato_core::store::StoreError;

use crate::api::extractors::Caller;
use crate::state::AppState;

mod session_order;
mod success;

/// Build the Checkout API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout/success", get(success::checkout_success))
        .route(
            "/orders/session/{session_id}",
            get(session_order::get_order_by_session),
        )
}

/// Reject callers who do not own `order`. Orders without a user are visible
/// to any identified caller.
fn ensure_owner(order: &OrderRecord, caller: &Caller) -> Result<(), CheckoutApiError> {
    match order.user_id.as_deref() {
        Some(owner) if owner != caller.user_id => {
            tracing::warn!(
                order_id = %order.order_id,
                caller = %caller.user_id,
                "Caller does not own the order"
            );
            Err(CheckoutApiError::Forbidden)
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Checkout API handlers.
#[derive(Debug)]
enum CheckoutApiError {
    /// A store operation failed.
    Store(StoreError),
    /// The provider session cannot describe an order.
    InvalidSessionData(SessionDataError),
    /// No session id was supplied.
    MissingSessionId,
    /// The provider does not know the session.
    SessionNotFound,
    /// The requested order was not found.
    NotFound,
    /// The order belongs to another user.
    Forbidden,
}

impl From<StoreError> for CheckoutApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<mercato_core::orders::CreateOrderError> for CheckoutApiError {
    fn from(err: mercato_core::orders::CreateOrderError) -> Self {
        use mercato_core::orders::CreateOrderError;
        match err {
            CreateOrderError::InvalidSessionData(e) => Self::InvalidSessionData(e),
            CreateOrderError::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CheckoutApiError::Store(e) => {
                tracing::error!(error = %e, "Checkout API store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            CheckoutApiError::InvalidSessionData(e) => {
                tracing::warn!(error = %e, "Checkout session cannot be turned into an order");
                (StatusCode::BAD_REQUEST, "invalid session data").into_response()
            }
            CheckoutApiError::MissingSessionId => {
                (StatusCode::BAD_REQUEST, "missing session_id").into_response()
            }
            CheckoutApiError::SessionNotFound => {
                (StatusCode::NOT_FOUND, "checkout session not found").into_response()
            }
            CheckoutApiError::NotFound => {
                (StatusCode::NOT_FOUND, "order not found").into_response()
            }
            CheckoutApiError::Forbidden => {
                (StatusCode::FORBIDDEN, "order belongs to another user").into_response()
            }
        }
    }
}
