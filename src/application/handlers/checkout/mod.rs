//! Checkout command and query handlers.

mod create_checkout_session;
mod event_handlers;
mod get_checkout_session;
mod handle_payment_webhook;

pub use create_checkout_session::{CreateCheckoutSessionCommand, CreateCheckoutSessionHandler};
pub use event_handlers::{
    default_dispatcher, CheckoutCompletedHandler, MandateUpdatedHandler,
    PaymentMethodUpdatedHandler,
};
pub use get_checkout_session::{GetCheckoutSessionHandler, GetCheckoutSessionQuery};
pub use handle_payment_webhook::{HandlePaymentWebhookCommand, HandlePaymentWebhookHandler};
