//! Provider webhook handler.
//!
//! `POST /webhooks/stripe` receives signed checkout events. A paid session
//! is turned into an order immediately; the handler never waits for the
//! browser. Any 2xx tells the provider to stop retrying, so only failures
//! worth retrying (store errors) produce a 5xx.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use mercato_core::orders::{CreateOrderError, SessionDescriptor};
use mercato_sdk::objects::{EventKind, WebhookAck};

use crate::api::extractors::VerifiedEvent;
use crate::state::AppState;

/// `POST /webhooks/stripe`: handle a verified provider event.
pub(super) async fn stripe_webhook(
    state: State<AppState>,
    VerifiedEvent(event): VerifiedEvent,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let kind = event.kind();
    tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Received provider event");

    match kind {
        EventKind::CheckoutCompleted | EventKind::AsyncPaymentSucceeded => {
            let session = event
                .checkout_session()
                .map_err(WebhookApiError::MalformedSession)?;

            // Delayed payment methods complete the session unpaid and
            // follow up with an async success event.
            if kind == EventKind::CheckoutCompleted && !session.is_settled() {
                tracing::info!(
                    session_id = %session.id,
                    payment_status = ?session.payment_status,
                    "Checkout completed without payment, awaiting async result"
                );
                return Ok(Json(WebhookAck::received()));
            }

            let result = state
                .creator
                .create_order_safely(&SessionDescriptor::from(&session))
                .await?;
            Ok(Json(WebhookAck::order(result.order.order_id, result.created)))
        }
        EventKind::AsyncPaymentFailed => {
            tracing::warn!(event_id = %event.id, "Asynchronous payment failed, no order created");
            Ok(Json(WebhookAck::received()))
        }
        EventKind::CheckoutExpired => {
            tracing::info!(event_id = %event.id, "Checkout session expired");
            Ok(Json(WebhookAck::received()))
        }
        EventKind::Other => {
            tracing::debug!(event_type = %event.event_type, "Ignoring unhandled event type");
            Ok(Json(WebhookAck::received()))
        }
    }
}

/// Errors that can occur in the webhook handler.
#[derive(Debug)]
pub(super) enum WebhookApiError {
    /// The event's `data.object` is not a checkout session.
    MalformedSession(serde_json::Error),
    /// Order creation failed.
    CreateOrder(CreateOrderError),
}

impl From<CreateOrderError> for WebhookApiError {
    fn from(err: CreateOrderError) -> Self {
        Self::CreateOrder(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebhookApiError::MalformedSession(e) => {
                tracing::warn!(error = %e, "Webhook event carries a malformed session");
                (StatusCode::BAD_REQUEST, "malformed checkout session").into_response()
            }
            WebhookApiError::CreateOrder(CreateOrderError::InvalidSessionData(e)) => {
                tracing::warn!(error = %e, "Webhook session cannot be turned into an order");
                (StatusCode::BAD_REQUEST, "invalid session data").into_response()
            }
            WebhookApiError::CreateOrder(CreateOrderError::Store(e)) => {
                tracing::error!(error = %e, "Webhook order creation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
