//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `VerifiedEvent`: verifies the `Stripe-Signature` header against the raw
//!   webhook body and parses the provider event (used by the webhook endpoint).
//! - `Caller`: the user id the upstream auth layer attached to the request
//!   (used by the checkout endpoints).
//!
//! All cryptographic operations are delegated to [`mercato_sdk::signature`].

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use mercato_sdk::objects::ProviderEvent;
use mercato_sdk::signature::{self, SIGNATURE_HEADER, SignatureError};

use crate::state::AppState;

/// Largest webhook body accepted.
const MAX_EVENT_BODY: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// VerifiedEvent: webhook authentication via signed raw body
// ---------------------------------------------------------------------------

/// An Axum extractor that verifies the `Stripe-Signature` header and
/// deserializes the authenticated event.
///
/// # Header format
///
/// ```text
/// Stripe-Signature: t={unix_timestamp},v1={hex_signature}
/// ```
///
/// The signature is `HMAC-SHA256("{timestamp}.{raw_body}", webhook_secret)`.
/// The body is verified byte-for-byte before it is parsed.
pub struct VerifiedEvent(pub ProviderEvent);

/// Errors that can occur during event verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifiedEventError {
    #[error("missing Stripe-Signature header")]
    MissingHeader,
    #[error("invalid Stripe-Signature header format")]
    InvalidHeader,
    #[error("failed to read request body")]
    BodyReadError,
    #[error("invalid event body: {0}")]
    JsonError(serde_json::Error),
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("signature expired")]
    Expired,
}

impl From<SignatureError> for VerifiedEventError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat
            | SignatureError::MissingTimestamp
            | SignatureError::NoSignatures => Self::InvalidHeader,
            SignatureError::SignatureMismatch => Self::VerificationFailed,
            SignatureError::Expired => Self::Expired,
        }
    }
}

impl IntoResponse for VerifiedEventError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            VerifiedEventError::MissingHeader => {
                (StatusCode::BAD_REQUEST, "missing Stripe-Signature header")
            }
            VerifiedEventError::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                "invalid Stripe-Signature header format",
            ),
            VerifiedEventError::BodyReadError => {
                (StatusCode::BAD_REQUEST, "failed to read request body")
            }
            VerifiedEventError::JsonError(_) => (StatusCode::BAD_REQUEST, "invalid event body"),
            VerifiedEventError::VerificationFailed => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
            VerifiedEventError::Expired => (StatusCode::UNAUTHORIZED, "signature expired"),
        };
        tracing::warn!(error = %self, "Rejected webhook delivery");
        (status, message).into_response()
    }
}

impl FromRequest<AppState> for VerifiedEvent {
    type Rejection = VerifiedEventError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = req
            .headers()
            .get(SIGNATURE_HEADER)
            .ok_or(VerifiedEventError::MissingHeader)?
            .to_str()
            .map_err(|_| VerifiedEventError::InvalidHeader)?
            .to_owned();

        let body_bytes = axum::body::to_bytes(req.into_body(), MAX_EVENT_BODY)
            .await
            .map_err(|_| VerifiedEventError::BodyReadError)?;

        let stripe = state.config.stripe.read().await;
        signature::verify_payload(
            &body_bytes,
            &header_value,
            stripe.webhook_secret_bytes(),
            stripe.tolerance_secs,
        )?;
        drop(stripe);

        let event: ProviderEvent =
            serde_json::from_slice(&body_bytes).map_err(VerifiedEventError::JsonError)?;
        Ok(VerifiedEvent(event))
    }
}

// ---------------------------------------------------------------------------
// Caller: identity attached by the upstream auth layer
// ---------------------------------------------------------------------------

/// The authenticated user making the request.
///
/// Read from the configured identity header (default
/// `x-authenticated-user`). Session issuance and verification happen
/// upstream; this service only trusts the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

/// Errors returned by the [`Caller`] extractor.
#[derive(Debug)]
pub enum CallerError {
    Unauthenticated,
}

impl IntoResponse for CallerError {
    fn into_response(self) -> Response {
        match self {
            CallerError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "authentication required").into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = CallerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let server = state.config.server.read().await;
        let user_id = parts
            .headers
            .get(server.identity_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(CallerError::Unauthenticated)?
            .to_owned();
        drop(server);

        Ok(Caller { user_id })
    }
}
