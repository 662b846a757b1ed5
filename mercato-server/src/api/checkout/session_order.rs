use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use super::{CheckoutApiError, ensure_owner};
use crate::api::extractors::Caller;
use crate::api::to_response;
use crate::state::AppState;

/// `GET /orders/session/{session_id}`: get the order created for a session.
///
/// Used by the storefront to check back after a `202 processing` answer.
pub(super) async fn get_order_by_session(
    state: State<AppState>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let order = state
        .orders
        .find_by_session_id(&session_id)
        .await?
        .ok_or(CheckoutApiError::NotFound)?;
    ensure_owner(&order, &caller)?;
    Ok(Json(to_response(&order)))
}
