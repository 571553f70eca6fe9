//! HTTP handlers for checkout endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Json, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;

use crate::application::handlers::checkout::{
    default_dispatcher, CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
    GetCheckoutSessionHandler, GetCheckoutSessionQuery, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler,
};
use crate::config::AppConfig;
use crate::domain::checkout::{CheckoutError, EventDispatcher, SetupSessionPolicy, WebhookError};
use crate::ports::PaymentProvider;

use super::dto::{
    CheckoutSessionQuery, ConfigResponse, CreateCheckoutSessionRequest,
    CreateCheckoutSessionResponse,
};

/// Header carrying the webhook signature.
pub const STRIPE_SIGNATURE: &str = "stripe-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is read-only.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub dispatcher: Arc<EventDispatcher>,
    pub session_policy: Arc<SetupSessionPolicy>,
    pub publishable_key: Arc<str>,
    pub webhook_max_body_bytes: usize,
}

impl CheckoutAppState {
    /// Wire state from configuration with the built-in event handlers.
    pub fn new(config: &AppConfig, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        let dispatcher = default_dispatcher(
            payment_provider.clone(),
            config.checkout.featured_item_name.clone(),
        );
        Self {
            payment_provider,
            dispatcher: Arc::new(dispatcher),
            session_policy: Arc::new(SetupSessionPolicy::from_config(&config.checkout)),
            publishable_key: Arc::from(config.payment.stripe_publishable_key.as_str()),
            webhook_max_body_bytes: config.checkout.webhook_max_body_bytes,
        }
    }

    /// Replace the event dispatcher, e.g. to register extra handlers.
    pub fn with_dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    /// Create handlers on demand from the shared state.
    pub fn create_session_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(
            self.payment_provider.clone(),
            self.session_policy.clone(),
        )
    }

    pub fn get_session_handler(&self) -> GetCheckoutSessionHandler {
        GetCheckoutSessionHandler::new(self.payment_provider.clone())
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.payment_provider.clone(),
            self.dispatcher.clone(),
            self.webhook_max_body_bytes,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /config - Publishable key for the browser client
pub async fn get_config(State(state): State<CheckoutAppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        public_key: state.publishable_key.to_string(),
    })
}

/// POST /create-checkout-session - Start a setup-mode checkout
pub async fn create_checkout_session(
    State(state): State<CheckoutAppState>,
    body: Option<Json<CreateCheckoutSessionRequest>>,
) -> Result<Json<CreateCheckoutSessionResponse>, CheckoutApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let cmd = CreateCheckoutSessionCommand {
        customer_id: request.customer_id,
        locale: request.locale,
    };
    let session = state.create_session_handler().handle(cmd).await?;

    Ok(Json(CreateCheckoutSessionResponse {
        session_id: session.id,
    }))
}

/// GET /checkout-session?sessionId= - Fetch a session as returned by Stripe
pub async fn get_checkout_session(
    State(state): State<CheckoutAppState>,
    Query(query): Query<CheckoutSessionQuery>,
) -> Result<Json<serde_json::Value>, CheckoutApiError> {
    let session = state
        .get_session_handler()
        .handle(GetCheckoutSessionQuery {
            session_id: query.session_id,
        })
        .await?;

    Ok(Json(session.object))
}

/// POST /webhook - Receive Stripe events
///
/// The body is read here, under the size cap, so that verification sees
/// the exact bytes Stripe signed.
pub async fn handle_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, WebhookApiError> {
    let limit = state.webhook_max_body_bytes;

    if declared_length(&headers).is_some_and(|len| len > limit as u64) {
        return Err(WebhookError::PayloadTooLarge { limit }.into());
    }
    let payload = read_capped(body, limit).await?;

    let signature = headers
        .get(STRIPE_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state
        .webhook_handler()
        .handle(HandlePaymentWebhookCommand {
            payload: payload.to_vec(),
            signature,
        })
        .await?;

    Ok(StatusCode::OK)
}

/// GET /healthz - Liveness probe
pub async fn healthz() -> &'static str {
    "ok"
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

async fn read_capped(body: Body, limit: usize) -> Result<Bytes, WebhookError> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        if exceeds_length_limit(&err) {
            WebhookError::PayloadTooLarge { limit }
        } else {
            WebhookError::UnreadableBody(err.to_string())
        }
    })
}

fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for the session endpoints.
pub struct CheckoutApiError(CheckoutError);

impl From<CheckoutError> for CheckoutApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        match self.0 {
            CheckoutError::MissingParameter(name) => {
                tracing::warn!(parameter = name, "Missing request parameter");
                status.into_response()
            }
            CheckoutError::Remote(err) => {
                tracing::error!(code = %err.code, error = %err.message, "Payment provider call failed");
                (status, err.message).into_response()
            }
        }
    }
}

/// API error type for the webhook endpoint.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_success() {
            return status.into_response();
        }
        tracing::warn!(status = status.as_u16(), error = %self.0, "Webhook rejected");
        (status, self.0.to_string()).into_response()
    }
}
