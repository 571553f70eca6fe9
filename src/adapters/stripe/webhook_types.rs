//! Stripe-specific wire types.
//!
//! These types represent Stripe API objects as they arrive in webhook payloads
//! and API responses. They are designed to:
//! - Parse actual Stripe JSON leniently (setup sessions omit many fields)
//! - Map to port types for further processing

use serde::{Deserialize, Serialize};

use crate::ports::{
    CheckoutSession, CompletedCheckout, Customer, DisplayItem, MandateUpdate, PaymentError,
    PaymentErrorCode, PaymentMethodUpdate, WebhookEvent, WebhookEventData,
};

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty.
    MissingHeader,
    /// A comma-separated part has no `=`.
    MalformedPart,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// No v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing Stripe-Signature header"),
            Self::MalformedPart => write!(f, "Malformed Stripe-Signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed Stripe-Signature header components.
///
/// The header format is: `t=timestamp,v1=signature[,v1=signature...][,v0=legacy]`.
/// Stripe sends one `v1` entry per active signing secret, so more than one
/// may be present during secret rotation.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe generated the event.
    pub timestamp: i64,

    /// All v1 signatures (HMAC-SHA256, hex-decoded).
    pub v1_signatures: Vec<Vec<u8>>,

    /// Legacy v0 signature (test-mode only, never verified).
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse a Stripe-Signature header into components.
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MalformedPart)?;
            let value = value.trim();

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    let bytes = hex::decode(value)
                        .map_err(|_| SignatureParseError::InvalidSignatureFormat)?;
                    v1_signatures.push(bytes);
                }
                "v0" => {
                    v0_signature = hex::decode(value).ok();
                }
                // Unknown schemes are skipped
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
            v0_signature,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Event Types
// ════════════════════════════════════════════════════════════════════════════════

/// Raw Stripe webhook event as received from the API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: StripeEventData,

    /// Whether this is a live or test event.
    #[serde(default)]
    pub livemode: bool,

    /// Stripe API version used for this event.
    pub api_version: Option<String>,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,

    /// Previous values for updated fields (on update events).
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeWebhookEvent {
    /// Parse a verified payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            PaymentError::new(PaymentErrorCode::InvalidRequest, format!("Invalid JSON: {}", e))
        })
    }

    /// Convert into the port's typed event.
    ///
    /// Unrecognised tags, and recognised tags whose object does not match
    /// the expected shape, keep their raw object as `Unknown`.
    pub fn into_event(self) -> WebhookEvent {
        let StripeWebhookEvent {
            id,
            event_type,
            created,
            data,
            livemode,
            ..
        } = self;

        let data = match decode_typed(&event_type, &data.object) {
            Ok(Some(typed)) => typed,
            Ok(None) => WebhookEventData::Unknown {
                event_type,
                object: data.object,
            },
            Err(e) => {
                tracing::warn!(
                    event_id = %id,
                    event_type = %event_type,
                    error = %e,
                    "Webhook object does not match its event type, keeping raw payload"
                );
                WebhookEventData::Unknown {
                    event_type,
                    object: data.object,
                }
            }
        };

        WebhookEvent {
            id,
            created_at: created,
            livemode,
            data,
        }
    }
}

fn decode_typed(
    event_type: &str,
    object: &serde_json::Value,
) -> Result<Option<WebhookEventData>, serde_json::Error> {
    let data = match event_type {
        WebhookEventData::CHECKOUT_SESSION_COMPLETED => {
            let session = StripeCheckoutSession::deserialize(object)?;
            WebhookEventData::CheckoutSessionCompleted(session.into_completed())
        }
        WebhookEventData::MANDATE_UPDATED => {
            let mandate = StripeMandate::deserialize(object)?;
            WebhookEventData::MandateUpdated(MandateUpdate {
                mandate_id: mandate.id,
                status: mandate.status,
                payment_method_id: mandate.payment_method.map(Expandable::into_id),
            })
        }
        WebhookEventData::PAYMENT_METHOD_AUTOMATICALLY_UPDATED => {
            let method = StripePaymentMethod::deserialize(object)?;
            WebhookEventData::PaymentMethodAutomaticallyUpdated(PaymentMethodUpdate {
                payment_method_id: method.id,
                method_type: method.method_type,
                customer_id: method.customer.map(Expandable::into_id),
            })
        }
        _ => return Ok(None),
    };
    Ok(Some(data))
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Object Types
// ════════════════════════════════════════════════════════════════════════════════

/// A field Stripe returns either as an ID or, when expanded, as an object.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn into_id(self) -> String {
        match self {
            Expandable::Id(id) | Expandable::Object { id } => id,
        }
    }
}

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Customer if one was attached or created.
    pub customer: Option<Expandable>,

    /// Payment mode (payment, setup, subscription).
    pub mode: Option<String>,

    /// Session status (open, complete, expired).
    pub status: Option<String>,

    /// Hosted checkout page.
    pub url: Option<String>,

    /// Success URL for redirect after checkout.
    pub success_url: Option<String>,

    /// Cancel URL for redirect if checkout is abandoned.
    pub cancel_url: Option<String>,

    /// Line items shown on the checkout page.
    #[serde(default)]
    pub display_items: Vec<StripeDisplayItem>,
}

/// Checkout session display item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeDisplayItem {
    /// Item type ("custom", "plan", "sku").
    #[serde(rename = "type", default)]
    pub item_type: String,

    /// Present for custom items.
    pub custom: Option<StripeCustomItem>,

    pub quantity: Option<i64>,
}

/// Custom display item details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomItem {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl StripeCheckoutSession {
    fn into_completed(self) -> CompletedCheckout {
        CompletedCheckout {
            session_id: self.id,
            customer_id: self.customer.map(Expandable::into_id),
            mode: self.mode,
            display_items: self
                .display_items
                .into_iter()
                .map(|item| DisplayItem {
                    kind: item.item_type,
                    name: item.custom.and_then(|custom| custom.name),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }

    /// Build the port session from a full API object, keeping it verbatim.
    pub fn into_session(object: serde_json::Value) -> Result<CheckoutSession, PaymentError> {
        let session: StripeCheckoutSession =
            serde_json::from_value(object.clone()).map_err(|e| {
                PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
            })?;

        Ok(CheckoutSession {
            id: session.id,
            mode: session.mode,
            customer_id: session.customer.map(Expandable::into_id),
            status: session.status,
            url: session.url,
            object,
        })
    }
}

/// Stripe Customer object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomer {
    /// Unique customer identifier (cus_...).
    pub id: String,

    /// Customer email address.
    pub email: Option<String>,

    /// Customer name.
    pub name: Option<String>,

    /// Unix timestamp of creation. Absent on deleted customers.
    #[serde(default)]
    pub created: i64,

    /// Whether the customer has been deleted.
    #[serde(default)]
    pub deleted: bool,
}

impl From<StripeCustomer> for Customer {
    fn from(customer: StripeCustomer) -> Self {
        Customer {
            id: customer.id,
            email: customer.email,
            name: customer.name,
            created_at: customer.created,
        }
    }
}

/// Stripe Mandate object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeMandate {
    /// Mandate ID (mandate_...).
    pub id: String,

    /// active, inactive, pending.
    pub status: Option<String>,

    pub payment_method: Option<Expandable>,
}

/// Stripe PaymentMethod object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentMethod {
    /// Payment method ID (pm_...).
    pub id: String,

    #[serde(rename = "type")]
    pub method_type: Option<String>,

    pub customer: Option<Expandable>,
}

// ════════════════════════════════════════════════════════════════════════════════
// API Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Error envelope returned by the Stripe API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    /// api_error, card_error, idempotency_error, invalid_request_error.
    #[serde(rename = "type")]
    pub error_type: Option<String>,

    pub code: Option<String>,

    pub message: Option<String>,
}
