//! Checkout domain - setup sessions and webhook event routing.
//!
//! - `SetupSessionPolicy` builds provider requests for setup-mode sessions
//! - `EventDispatcher` routes verified webhook events to handlers
//! - `WebhookError` / `CheckoutError` map failures to HTTP statuses

mod dispatch;
mod errors;
mod session;

pub use dispatch::{DispatchOutcome, EventDispatcher, HandlerOutcome, WebhookEventHandler};
pub use errors::{CheckoutError, WebhookError};
pub use session::{SetupSessionPolicy, CHECKOUT_SESSION_ID_PLACEHOLDER};
