//! HTTP DTOs (Data Transfer Objects) for checkout endpoints.
//!
//! These types define the JSON shapes the browser client sends and expects.
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Optional body of `POST /create-checkout-session`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    /// Existing customer to attach.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Checkout page locale.
    #[serde(default)]
    pub locale: Option<String>,
}

/// Query string of `GET /checkout-session`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response of `GET /config`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub public_key: String,
}

/// Response of `POST /create-checkout-session`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionResponse {
    pub session_id: String,
}
