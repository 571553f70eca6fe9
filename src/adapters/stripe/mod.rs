//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe integration, including:
//! - Customer creation and lookup
//! - Setup-mode checkout sessions
//! - Webhook signature verification
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute default window)
//! - All secrets are handled via `secrecy::SecretString`

mod mock_payment_provider;
mod signature;
mod stripe_adapter;
mod webhook_types;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use signature::{SignatureVerifier, DEFAULT_TOLERANCE_SECS};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
pub use webhook_types::{
    SignatureHeader, SignatureParseError, StripeCheckoutSession, StripeCustomer,
    StripeWebhookEvent,
};
