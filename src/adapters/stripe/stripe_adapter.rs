//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait for Stripe API integration.
//! Handles customer management, setup-mode checkout sessions, and webhook
//! verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::from_payment_config(&app_config.payment);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::PaymentConfig;
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentErrorCode, PaymentProvider, WebhookEvent,
};

use super::signature::{SignatureVerifier, DEFAULT_TOLERANCE_SECS};
use super::webhook_types::{
    StripeCheckoutSession, StripeCustomer, StripeErrorResponse, StripeWebhookEvent,
};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Whether to reject test-mode events.
    require_livemode: bool,

    /// Maximum webhook event age in seconds.
    signature_tolerance_secs: i64,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            require_livemode: false,
            signature_tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Create configuration from the loaded application config.
    pub fn from_payment_config(payment: &PaymentConfig) -> Self {
        let mut config = Self::new(
            payment.stripe_secret_key.clone(),
            payment.stripe_webhook_secret.clone(),
        )
        .with_require_livemode(payment.require_livemode);

        if let Some(url) = &payment.stripe_api_base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(tolerance) = payment.signature_tolerance_secs {
            config = config.with_signature_tolerance(tolerance);
        }
        config
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Require livemode events.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    /// Override the webhook replay window.
    pub fn with_signature_tolerance(mut self, secs: i64) -> Self {
        self.signature_tolerance_secs = secs;
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("require_livemode", &self.require_livemode)
            .field("signature_tolerance_secs", &self.signature_tolerance_secs)
            .finish()
    }
}

/// Stripe payment provider adapter.
///
/// Implements `PaymentProvider` for Stripe API integration.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    verifier: SignatureVerifier,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        let verifier = SignatureVerifier::new(config.webhook_secret.expose_secret().clone())
            .with_tolerance(config.signature_tolerance_secs);
        Self {
            config,
            verifier,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Parse a verified payload and convert to port types.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let stripe_event = StripeWebhookEvent::from_slice(payload)?;

        if self.config.require_livemode && !stripe_event.livemode {
            tracing::warn!(
                event_id = %stripe_event.id,
                "Rejected test mode event in production"
            );
            return Err(PaymentError::invalid_webhook(
                "Test mode events not allowed in production",
            ));
        }

        Ok(stripe_event.into_event())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, PaymentError> {
        let response = request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        response
            .json()
            .await
            .map_err(|e| PaymentError::provider(format!("Failed to parse Stripe response: {}", e)))
    }
}

/// Map a non-2xx Stripe response to a `PaymentError`.
async fn error_from_response(response: reqwest::Response) -> PaymentError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let (message, provider_code) = match serde_json::from_str::<StripeErrorResponse>(&body) {
        Ok(parsed) => (
            parsed.error.message.unwrap_or_else(|| body.clone()),
            parsed.error.code,
        ),
        Err(_) => (format!("Stripe API error ({}): {}", status.as_u16(), body), None),
    };

    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            PaymentErrorCode::AuthenticationError
        }
        reqwest::StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
        reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        reqwest::StatusCode::BAD_REQUEST => PaymentErrorCode::InvalidRequest,
        _ => PaymentErrorCode::ProviderError,
    };

    tracing::error!(status = %status, error = %message, "Stripe API call failed");

    let err = PaymentError::new(code, message);
    match provider_code {
        Some(provider_code) => err.with_provider_code(provider_code),
        None => err,
    }
}

/// Stripe object IDs are alphanumeric with underscores.
fn validate_object_id(id: &str, what: &str) -> Result<(), PaymentError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(PaymentError::new(
            PaymentErrorCode::InvalidRequest,
            format!("Invalid {} id: {}", what, id),
        ))
    }
}

/// Form parameters for `POST /v1/checkout/sessions`.
fn checkout_session_params(request: &CreateCheckoutRequest) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = request
        .payment_method_types
        .iter()
        .enumerate()
        .map(|(i, method)| (format!("payment_method_types[{}]", i), method.clone()))
        .collect();

    params.push(("mode".to_string(), request.mode.as_str().to_string()));
    params.push(("success_url".to_string(), request.success_url.clone()));
    params.push(("cancel_url".to_string(), request.cancel_url.clone()));

    if let Some(customer) = &request.customer_id {
        params.push(("customer".to_string(), customer.clone()));
    }
    if let Some(locale) = &request.locale {
        params.push(("locale".to_string(), locale.clone()));
    }

    params
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(email) = &request.email {
            params.push(("email", email.clone()));
        }
        if let Some(name) = &request.name {
            params.push(("name", name.clone()));
        }

        let response = self
            .send(self.http_client.post(self.url("/v1/customers")).form(&params))
            .await?;
        let stripe_customer: StripeCustomer = Self::read_json(response).await?;

        tracing::info!(customer_id = %stripe_customer.id, "Created Stripe customer");
        Ok(stripe_customer.into())
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        validate_object_id(customer_id, "customer")?;

        let url = self.url(&format!("/v1/customers/{}", customer_id));
        let response = match self.send(self.http_client.get(&url)).await {
            Ok(response) => response,
            Err(err) if err.code == PaymentErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        let stripe_customer: StripeCustomer = Self::read_json(response).await?;
        if stripe_customer.deleted {
            return Ok(None);
        }

        Ok(Some(stripe_customer.into()))
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = checkout_session_params(&request);

        let response = self
            .send(
                self.http_client
                    .post(self.url("/v1/checkout/sessions"))
                    .form(&params),
            )
            .await?;
        let object: serde_json::Value = Self::read_json(response).await?;
        let session = StripeCheckoutSession::into_session(object)?;

        tracing::info!(
            session_id = %session.id,
            customer_id = ?session.customer_id,
            mode = request.mode.as_str(),
            "Created checkout session"
        );
        Ok(session)
    }

    async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        validate_object_id(session_id, "checkout session")?;

        let url = self.url(&format!("/v1/checkout/sessions/{}", session_id));
        let response = self.send(self.http_client.get(&url)).await?;
        let object: serde_json::Value = Self::read_json(response).await?;

        StripeCheckoutSession::into_session(object)
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        // 1. Verify signature (includes timestamp validation)
        self.verifier.verify(payload, signature)?;

        // 2. Parse and convert event
        let event = self.parse_event(payload)?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type(),
            livemode = event.livemode,
            "Webhook signature verified"
        );

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{SessionMode, WebhookEventData};

    const SECRET: &str = "whsec_test_secret";

    fn test_config() -> StripeConfig {
        StripeConfig::new("sk_test_key", SECRET)
    }

    fn sign_now(payload: &str) -> String {
        SignatureVerifier::new(SECRET)
            .sign(payload.as_bytes(), chrono::Utc::now().timestamp())
            .unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_new_sets_defaults() {
        let config = StripeConfig::new("api_key", "webhook_secret");
        assert_eq!(config.api_base_url(), "https://api.stripe.com");
        assert!(!config.require_livemode);
        assert_eq!(config.signature_tolerance_secs, 300);
    }

    #[test]
    fn config_with_base_url_trims_slash() {
        let config = StripeConfig::new("key", "secret").with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url(), "http://localhost:12111");
    }

    #[test]
    fn config_from_payment_config() {
        let payment = PaymentConfig {
            stripe_secret_key: "sk_test_1".to_string(),
            stripe_publishable_key: "pk_test_1".to_string(),
            stripe_webhook_secret: "whsec_1".to_string(),
            stripe_api_base_url: Some("http://stripe-mock:12111".to_string()),
            require_livemode: true,
            signature_tolerance_secs: Some(120),
        };

        let config = StripeConfig::from_payment_config(&payment);
        assert_eq!(config.api_base_url(), "http://stripe-mock:12111");
        assert!(config.require_livemode);
        assert_eq!(config.signature_tolerance_secs, 120);
    }

    #[test]
    fn config_debug_redacts_secrets() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("sk_test_key"));
        assert!(!rendered.contains(SECRET));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Request Building Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn checkout_params_for_setup_session() {
        let request = CreateCheckoutRequest {
            customer_id: Some("cus_123".to_string()),
            payment_method_types: vec!["bacs_debit".to_string()],
            mode: SessionMode::Setup,
            success_url: "http://localhost:4242/success.html?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "http://localhost:4242/canceled.html".to_string(),
            locale: Some("en".to_string()),
        };

        let params = checkout_session_params(&request);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("payment_method_types[0]"), Some("bacs_debit"));
        assert_eq!(get("mode"), Some("setup"));
        assert_eq!(get("customer"), Some("cus_123"));
        assert_eq!(get("locale"), Some("en"));
        assert_eq!(
            get("success_url"),
            Some("http://localhost:4242/success.html?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    #[test]
    fn checkout_params_omit_absent_customer() {
        let request = CreateCheckoutRequest {
            customer_id: None,
            payment_method_types: vec!["bacs_debit".to_string(), "sepa_debit".to_string()],
            mode: SessionMode::Setup,
            success_url: "s".to_string(),
            cancel_url: "c".to_string(),
            locale: None,
        };

        let params = checkout_session_params(&request);
        assert!(params.iter().all(|(k, _)| k != "customer" && k != "locale"));
        assert!(params
            .iter()
            .any(|(k, v)| k == "payment_method_types[1]" && v == "sepa_debit"));
    }

    #[test]
    fn object_id_validation() {
        assert!(validate_object_id("cs_test_a1B2", "session").is_ok());
        assert!(validate_object_id("", "session").is_err());
        assert!(validate_object_id("../v1/customers", "session").is_err());
        assert!(validate_object_id("cs_1?expand=x", "session").is_err());
    }

    #[tokio::test]
    async fn get_checkout_session_rejects_bad_id_before_network() {
        let adapter = StripePaymentAdapter::new(
            test_config().with_base_url("http://127.0.0.1:9"),
        );
        let err = adapter.get_checkout_session("cs/../x").await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidRequest);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Event Parsing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_rejects_test_mode_when_livemode_required() {
        let adapter = StripePaymentAdapter::new(test_config().with_require_livemode(true));
        let payload = r#"{
            "id": "evt_test",
            "type": "mandate.updated",
            "created": 1704067200,
            "data": {"object": {"id": "mandate_1"}},
            "livemode": false
        }"#;

        let err = adapter.parse_event(payload.as_bytes()).unwrap_err();
        assert!(err.message.contains("Test mode"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Integration Tests (verify_webhook full flow)
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn verify_webhook_valid_signature_and_payload() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{
            "id": "evt_test123",
            "type": "checkout.session.completed",
            "created": 1704067200,
            "data": {
                "object": {
                    "id": "cs_test",
                    "object": "checkout.session",
                    "customer": "cus_test",
                    "mode": "setup",
                    "status": "complete"
                }
            },
            "livemode": false
        }"#;

        let event = adapter
            .verify_webhook(payload.as_bytes(), &sign_now(payload))
            .await
            .unwrap();

        assert_eq!(event.id, "evt_test123");
        assert!(matches!(
            event.data,
            WebhookEventData::CheckoutSessionCompleted(ref c) if c.customer_id.as_deref() == Some("cus_test")
        ));
    }

    #[tokio::test]
    async fn verify_webhook_rejects_invalid_signature() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let signature = format!("t={},v1=deadbeef", chrono::Utc::now().timestamp());

        let err = adapter
            .verify_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn verify_webhook_rejects_malformed_header() {
        let adapter = StripePaymentAdapter::new(test_config());
        let result = adapter
            .verify_webhook(br#"{"id":"evt_test"}"#, "malformed_header")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn verify_webhook_rejects_invalid_json() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = "not valid json";

        let err = adapter
            .verify_webhook(payload.as_bytes(), &sign_now(payload))
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidRequest);
        assert!(err.message.contains("Invalid JSON"));
    }
}
