//! HTTP adapter for the setup-mode checkout flow.
//!
//! Exposes the browser-facing JSON endpoints, the Stripe webhook receiver
//! and the static client bundle.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{
    CheckoutSessionQuery, ConfigResponse, CreateCheckoutSessionRequest,
    CreateCheckoutSessionResponse,
};
pub use handlers::{CheckoutApiError, CheckoutAppState, WebhookApiError, STRIPE_SIGNATURE};
pub use routes::{checkout_app, checkout_routes};
