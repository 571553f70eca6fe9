//! Error types for the checkout flow.
//!
//! `WebhookError` covers everything that can go wrong before an event is
//! accepted, with HTTP status mapping. `CheckoutError` covers the
//! gateway-backed endpoints.

use axum::http::StatusCode;
use thiserror::Error;

use crate::ports::{PaymentError, PaymentErrorCode};

/// Errors that occur while receiving a webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Body exceeded the configured size cap.
    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Body could not be read from the connection.
    #[error("Unreadable body: {0}")]
    UnreadableBody(String),

    /// No signature header on the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// Signature header malformed, stale, or not matching the payload.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Signature matched but the payload is not a valid event.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A handler could not look up the customer behind an event.
    #[error("Customer lookup failed: {0}")]
    CustomerLookup(String),
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    ///
    /// Handler failures happen after the event was authenticated and are
    /// acknowledged so the provider does not redeliver.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::PayloadTooLarge { .. } => StatusCode::SERVICE_UNAVAILABLE,

            WebhookError::UnreadableBody(_)
            | WebhookError::MissingSignature
            | WebhookError::InvalidSignature(_)
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::CustomerLookup(_) => StatusCode::OK,
        }
    }

    /// Classify a failed `verify_webhook` call.
    ///
    /// A payload the provider could not decode is a parse error; every other
    /// failure means the delivery was not authenticated.
    pub fn from_verification(err: PaymentError) -> Self {
        match err.code {
            PaymentErrorCode::InvalidRequest => WebhookError::ParseError(err.message),
            _ => WebhookError::InvalidSignature(err.message),
        }
    }
}

/// Errors from the checkout session endpoints.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required request parameter was absent or empty.
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// The payment provider rejected or failed the call.
    #[error(transparent)]
    Remote(#[from] PaymentError),
}

impl CheckoutError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Remote(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
