//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `stripe` - Stripe REST API, webhook verification and an in-memory mock
//! - `http` - Axum routes for the browser client and webhook delivery

pub mod http;
pub mod stripe;

pub use http::checkout::{checkout_app, CheckoutAppState};
pub use stripe::{MockPaymentProvider, StripeConfig, StripePaymentAdapter};
