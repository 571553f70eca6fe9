//! Payment provider port for external payment processing.
//!
//! Defines the contract for the remote payment processor (e.g., Stripe).
//! Implementations create and fetch checkout sessions, manage customer
//! records, and authenticate webhook deliveries.
//!
//! # Design
//!
//! - **Gateway agnostic**: handlers only see these types, never Stripe JSON
//! - **Typed events**: webhook payloads arrive as a sum type with a raw fallback
//! - **No retries**: every failure surfaces immediately as a `PaymentError`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer in the payment system.
    async fn create_customer(&self, request: CreateCustomerRequest)
        -> Result<Customer, PaymentError>;

    /// Get customer by provider ID.
    ///
    /// Returns `Ok(None)` when the customer does not exist or was deleted.
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError>;

    /// Create a checkout session.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Fetch a checkout session by provider ID.
    async fn get_checkout_session(&self, session_id: &str)
        -> Result<CheckoutSession, PaymentError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Returns the parsed event if valid, error if signature invalid.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Customer email address.
    pub email: Option<String>,

    /// Customer name.
    pub name: Option<String>,
}

/// Customer in the payment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Provider's customer ID.
    pub id: String,

    /// Customer email.
    pub email: Option<String>,

    /// Customer name.
    pub name: Option<String>,

    /// When the customer was created (provider timestamp).
    pub created_at: i64,
}

/// Checkout session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Collect payment details for later use without charging.
    Setup,
    /// One-off payment.
    Payment,
    /// Recurring subscription.
    Subscription,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Setup => "setup",
            SessionMode::Payment => "payment",
            SessionMode::Subscription => "subscription",
        }
    }
}

/// Request to create a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Provider customer ID to attach, if any.
    pub customer_id: Option<String>,

    /// Payment method types offered on the checkout page.
    pub payment_method_types: Vec<String>,

    /// Session mode.
    pub mode: SessionMode,

    /// URL to redirect after successful checkout.
    pub success_url: String,

    /// URL to redirect after canceled checkout.
    pub cancel_url: String,

    /// Checkout page locale (e.g., "en", "auto").
    pub locale: Option<String>,
}

/// Checkout session as returned by the provider.
///
/// The typed fields are extracted for logging and assertions; `object`
/// holds the complete remote representation and is what callers see.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    /// Provider's session ID.
    pub id: String,

    /// Session mode as reported by the provider.
    pub mode: Option<String>,

    /// Attached customer, if any.
    pub customer_id: Option<String>,

    /// Session status (open, complete, expired).
    pub status: Option<String>,

    /// Hosted checkout URL, when the provider returns one.
    pub url: Option<String>,

    /// Full remote session object, unmodified.
    pub object: serde_json::Value,
}

/// Webhook event from payment provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    /// Event ID from provider.
    pub id: String,

    /// When the event occurred (Unix timestamp).
    pub created_at: i64,

    /// Whether this is a live mode event.
    pub livemode: bool,

    /// Typed event payload.
    pub data: WebhookEventData,
}

impl WebhookEvent {
    /// The provider's type tag for this event.
    pub fn event_type(&self) -> &str {
        self.data.event_type()
    }
}

/// Webhook event payload, one variant per recognised type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEventData {
    /// `checkout.session.completed`
    CheckoutSessionCompleted(CompletedCheckout),

    /// `mandate.updated`
    MandateUpdated(MandateUpdate),

    /// `payment_method.automatically_updated`
    PaymentMethodAutomaticallyUpdated(PaymentMethodUpdate),

    /// Any other tag; the raw object is kept for forward compatibility.
    Unknown {
        event_type: String,
        object: serde_json::Value,
    },
}

impl WebhookEventData {
    pub const CHECKOUT_SESSION_COMPLETED: &'static str = "checkout.session.completed";
    pub const MANDATE_UPDATED: &'static str = "mandate.updated";
    pub const PAYMENT_METHOD_AUTOMATICALLY_UPDATED: &'static str =
        "payment_method.automatically_updated";

    pub fn event_type(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted(_) => Self::CHECKOUT_SESSION_COMPLETED,
            Self::MandateUpdated(_) => Self::MANDATE_UPDATED,
            Self::PaymentMethodAutomaticallyUpdated(_) => {
                Self::PAYMENT_METHOD_AUTOMATICALLY_UPDATED
            }
            Self::Unknown { event_type, .. } => event_type,
        }
    }
}

/// Payload of a completed checkout session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedCheckout {
    pub session_id: String,
    pub customer_id: Option<String>,
    pub mode: Option<String>,
    pub display_items: Vec<DisplayItem>,
}

impl CompletedCheckout {
    /// Whether the session carried a custom line item with the given name.
    pub fn has_custom_item(&self, name: &str) -> bool {
        self.display_items
            .iter()
            .any(|item| item.kind == "custom" && item.name.as_deref() == Some(name))
    }
}

/// Line item shown on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayItem {
    /// Item type ("custom", "plan", "sku").
    pub kind: String,
    /// Display name for custom items.
    pub name: Option<String>,
    pub quantity: Option<i64>,
}

/// Payload of a `mandate.updated` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MandateUpdate {
    pub mandate_id: String,
    pub status: Option<String>,
    pub payment_method_id: Option<String>,
}

/// Payload of a `payment_method.automatically_updated` event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentMethodUpdate {
    pub payment_method_id: String,
    pub method_type: Option<String>,
    pub customer_id: Option<String>,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create an invalid webhook error.
    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidWebhook, message)
    }

    /// Create a provider API error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Request rejected by the provider as invalid.
    InvalidRequest,

    /// Invalid webhook signature or payload.
    InvalidWebhook,

    /// Provider API error.
    ProviderError,
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::InvalidWebhook => "invalid_webhook",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
