use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mercato_core::orders::{OrderWaiter, SessionDescriptor};
use mercato_sdk::objects::CheckoutConfirmation;
use serde::Deserialize;

use super::{CheckoutApiError, ensure_owner};
use crate::api::extractors::Caller;
use crate::api::to_response;
use crate::state::AppState;

const PROCESSING_MESSAGE: &str = "Your payment is being processed. Check back in a moment.";

#[derive(Debug, Deserialize)]
pub(super) struct SuccessQuery {
    #[serde(default)]
    session_id: String,
}

/// `GET /checkout/success?session_id=…`: confirm the order after the
/// provider redirects the browser back.
///
/// 1. An existing order is returned as is.
/// 2. Otherwise, when a provider client is configured, the session is
///    retrieved; a paid session is turned into the order right here, an
///    unknown one is a 404. Unpaid sessions and provider failures fall
///    through.
/// 3. Finally the handler waits for the webhook's order up to
///    `checkout.wait_timeout` and answers `202 processing` if it has not
///    appeared.
pub(super) async fn checkout_success(
    state: State<AppState>,
    caller: Caller,
    Query(query): Query<SuccessQuery>,
) -> Result<Response, CheckoutApiError> {
    let session_id = query.session_id.trim();
    if session_id.is_empty() {
        return Err(CheckoutApiError::MissingSessionId);
    }

    if let Some(order) = state.orders.find_by_session_id(session_id).await? {
        ensure_owner(&order, &caller)?;
        return Ok(confirmed(&order, false));
    }

    if let Some(sessions) = state.session_source().await {
        match sessions.retrieve_session(session_id).await {
            Ok(Some(session)) if session.is_settled() => {
                let descriptor =
                    SessionDescriptor::from(&session).with_fallback_user(Some(&caller.user_id));
                let result = state.creator.create_order_safely(&descriptor).await?;
                ensure_owner(&result.order, &caller)?;
                return Ok(confirmed(&result.order, result.created));
            }
            Ok(Some(session)) => {
                tracing::debug!(
                    session_id,
                    payment_status = ?session.payment_status,
                    "Session not paid yet, waiting for webhook"
                );
            }
            Ok(None) => return Err(CheckoutApiError::SessionNotFound),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Session lookup failed, waiting for webhook");
            }
        }
    }

    let checkout = *state.config.checkout.read().await;
    let waiter = OrderWaiter::from_config(state.orders.clone(), &checkout);
    match waiter
        .wait_for_order(session_id, checkout.wait_timeout)
        .await?
    {
        Some(order) => {
            ensure_owner(&order, &caller)?;
            Ok(confirmed(&order, false))
        }
        None => {
            tracing::info!(session_id, "Order not visible yet, asking client to check back");
            Ok((
                StatusCode::ACCEPTED,
                Json(CheckoutConfirmation::processing(PROCESSING_MESSAGE)),
            )
                .into_response())
        }
    }
}

fn confirmed(
    order: &mercato_core::entities::order_records::OrderRecord,
    created: bool,
) -> Response {
    Json(CheckoutConfirmation::confirmed(to_response(order), created)).into_response()
}
