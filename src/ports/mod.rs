//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Payment Ports
//!
//! - `PaymentProvider` - Remote payment processor (checkout sessions,
//!   customers, webhook verification)

mod payment_provider;

pub use payment_provider::{
    CheckoutSession, CompletedCheckout, CreateCheckoutRequest, CreateCustomerRequest, Customer,
    DisplayItem, MandateUpdate, PaymentError, PaymentErrorCode, PaymentMethodUpdate,
    PaymentProvider, SessionMode, WebhookEvent, WebhookEventData,
};
