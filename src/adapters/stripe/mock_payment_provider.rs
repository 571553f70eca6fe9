//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - An in-memory customer and session store (created sessions can be fetched)
//! - Error injection
//! - Call tracking
//! - Webhook verification that accepts everything, rejects everything,
//!   or checks real Stripe signatures

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::signature::SignatureVerifier;
use super::webhook_types::{StripeCheckoutSession, StripeWebhookEvent};
use crate::ports::{
    CheckoutSession, CompletedCheckout, CreateCheckoutRequest, CreateCustomerRequest, Customer,
    DisplayItem, PaymentError, PaymentProvider, WebhookEvent, WebhookEventData,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::with_webhook_secret("whsec_test");
/// mock.add_customer(Customer { id: "cus_123".into(), ... });
/// mock.set_method_error("get_customer", PaymentError::network("down"));
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    /// Known customers by ID.
    customers: HashMap<String, Customer>,

    /// Created or seeded sessions by ID.
    sessions: HashMap<String, CheckoutSession>,

    /// Next customer to return from `create_customer`.
    next_customer: Option<Customer>,

    /// Next webhook event to return on verification.
    next_webhook_event: Option<WebhookEvent>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// Webhook verification behavior.
    webhook_verify_mode: WebhookVerifyMode,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// How to handle webhook verification.
#[derive(Default, Clone)]
enum WebhookVerifyMode {
    /// Accept any signature and parse the payload.
    #[default]
    AcceptAll,

    /// Check the signature like the real adapter.
    Signed(SignatureVerifier),

    /// Always fail verification.
    AlwaysFail,
}

impl MockPaymentProvider {
    /// Create a new mock provider with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().webhook_verify_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    /// Create a mock that verifies `Stripe-Signature` headers with `secret`.
    pub fn with_webhook_secret(secret: &str) -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().webhook_verify_mode =
            WebhookVerifyMode::Signed(SignatureVerifier::new(secret));
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set the customer to return on next `create_customer` call.
    pub fn set_customer(&self, customer: Customer) {
        self.inner.lock().unwrap().next_customer = Some(customer);
    }

    /// Add a customer to the "database".
    pub fn add_customer(&self, customer: Customer) {
        let id = customer.id.clone();
        self.inner.lock().unwrap().customers.insert(id, customer);
    }

    /// Add a session that `get_checkout_session` will return.
    pub fn add_checkout_session(&self, session: CheckoutSession) {
        let id = session.id.clone();
        self.inner.lock().unwrap().sessions.insert(id, session);
    }

    /// Set the webhook event to return on verification.
    pub fn set_webhook_event(&self, event: WebhookEvent) {
        self.inner.lock().unwrap().next_webhook_event = Some(event);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Arguments of the most recent call to a method.
    pub fn last_args(&self, method: &str) -> Option<Vec<String>> {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .rev()
            .find(|c| c.method == method)
            .map(|c| c.args.clone())
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.inner.lock().unwrap();

        // Check method-specific error first
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Check global error (consumes it)
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockPaymentProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn mock_id(prefix: &str) -> String {
    format!("{}_mock_{}", prefix, uuid::Uuid::new_v4().simple())
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.record_call(
            "create_customer",
            vec![
                request.email.clone().unwrap_or_default(),
                request.name.clone().unwrap_or_default(),
            ],
        );
        self.check_error("create_customer")?;

        let mut state = self.inner.lock().unwrap();

        let customer = state.next_customer.take().unwrap_or_else(|| Customer {
            id: mock_id("cus"),
            email: request.email,
            name: request.name,
            created_at: chrono::Utc::now().timestamp(),
        });

        // Store for later retrieval
        state.customers.insert(customer.id.clone(), customer.clone());

        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        self.record_call("get_customer", vec![customer_id.to_string()]);
        self.check_error("get_customer")?;

        let state = self.inner.lock().unwrap();
        Ok(state.customers.get(customer_id).cloned())
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.record_call(
            "create_checkout_session",
            vec![
                request.customer_id.clone().unwrap_or_default(),
                request.mode.as_str().to_string(),
                request.payment_method_types.join(","),
                request.success_url.clone(),
                request.cancel_url.clone(),
                request.locale.clone().unwrap_or_default(),
            ],
        );
        self.check_error("create_checkout_session")?;

        let id = mock_id("cs_test");
        let object = json!({
            "id": id,
            "object": "checkout.session",
            "mode": request.mode.as_str(),
            "customer": request.customer_id,
            "payment_method_types": request.payment_method_types,
            "success_url": request.success_url,
            "cancel_url": request.cancel_url,
            "locale": request.locale,
            "status": "open",
            "url": format!("https://checkout.stripe.com/c/pay/{}", id),
        });
        let session = StripeCheckoutSession::into_session(object)?;

        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(session.id.clone(), session.clone());

        Ok(session)
    }

    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        self.record_call("get_checkout_session", vec![session_id.to_string()]);
        self.check_error("get_checkout_session")?;

        let state = self.inner.lock().unwrap();
        state.sessions.get(session_id).cloned().ok_or_else(|| {
            PaymentError::new(
                crate::ports::PaymentErrorCode::NotFound,
                format!("No such checkout.session: '{}'", session_id),
            )
            .with_provider_code("resource_missing")
        })
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.record_call(
            "verify_webhook",
            vec![
                String::from_utf8_lossy(payload).chars().take(50).collect(),
                signature.chars().take(20).collect(),
            ],
        );
        self.check_error("verify_webhook")?;

        let state = self.inner.lock().unwrap();

        // Check verification mode
        match &state.webhook_verify_mode {
            WebhookVerifyMode::AcceptAll => {}
            WebhookVerifyMode::Signed(verifier) => {
                verifier.verify(payload, signature)?;
            }
            WebhookVerifyMode::AlwaysFail => {
                return Err(PaymentError::invalid_webhook("Verification disabled"));
            }
        }

        // Return configured event or parse from payload
        if let Some(event) = &state.next_webhook_event {
            return Ok(event.clone());
        }

        Ok(StripeWebhookEvent::from_slice(payload)?.into_event())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Test Helpers
// ════════════════════════════════════════════════════════════════════════════════

impl MockPaymentProvider {
    /// Create a mock with one known customer.
    pub fn with_customer(customer_id: &str) -> Self {
        let mock = Self::new();
        mock.add_customer(Customer {
            id: customer_id.to_string(),
            email: Some("jenny.rosen@example.com".to_string()),
            name: Some("Jenny Rosen".to_string()),
            created_at: chrono::Utc::now().timestamp(),
        });
        mock
    }

    /// Create a checkout completed webhook event.
    pub fn checkout_completed_event(customer_id: &str, custom_items: &[&str]) -> WebhookEvent {
        WebhookEvent {
            id: mock_id("evt"),
            created_at: chrono::Utc::now().timestamp(),
            livemode: false,
            data: WebhookEventData::CheckoutSessionCompleted(CompletedCheckout {
                session_id: mock_id("cs_test"),
                customer_id: Some(customer_id.to_string()),
                mode: Some("setup".to_string()),
                display_items: custom_items
                    .iter()
                    .map(|name| DisplayItem {
                        kind: "custom".to_string(),
                        name: Some(name.to_string()),
                        quantity: Some(1),
                    })
                    .collect(),
            }),
        }
    }
}
