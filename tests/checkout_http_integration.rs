//! Integration tests for checkout HTTP endpoints.
//!
//! These tests drive the fully assembled application (routes, static file
//! fallback, tracing layer) against the in-memory payment provider.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use setup_checkout::adapters::http::checkout::{checkout_app, CheckoutAppState};
use setup_checkout::adapters::stripe::MockPaymentProvider;
use setup_checkout::config::AppConfig;
use setup_checkout::ports::{CheckoutSession, PaymentError, PaymentErrorCode};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn test_config(static_dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.payment.stripe_secret_key = "sk_test_123".to_string();
    config.payment.stripe_publishable_key = "pk_test_abc".to_string();
    config.payment.stripe_webhook_secret = "whsec_test".to_string();
    config.checkout.domain = "http://localhost:4242".to_string();
    config.checkout.static_dir = static_dir.display().to_string();
    config
}

fn client_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Set up a payment method</h1>").unwrap();
    std::fs::write(dir.path().join("success.html"), "<h1>Success</h1>").unwrap();
    dir
}

fn build_app(mock: &MockPaymentProvider, dir: &tempfile::TempDir) -> Router {
    let config = test_config(dir.path());
    let state = CheckoutAppState::new(&config, Arc::new(mock.clone()));
    checkout_app(state, &config.checkout.static_dir, &[])
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(body)
        .unwrap()
}

// =============================================================================
// GET /config
// =============================================================================

#[tokio::test]
async fn config_exposes_only_publishable_key() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir).oneshot(get("/config")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(object["publicKey"], "pk_test_abc");
}

#[tokio::test]
async fn config_only_accepts_get() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir)
        .oneshot(post("/config", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// POST /create-checkout-session
// =============================================================================

#[tokio::test]
async fn create_session_builds_setup_request() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir)
        .oneshot(post("/create-checkout-session", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["sessionId"].is_string());

    let args = mock.last_args("create_checkout_session").unwrap();
    assert!(args[0].starts_with("cus_mock_"));
    assert_eq!(args[1], "setup");
    assert_eq!(args[2], "bacs_debit");
    assert_eq!(
        args[3],
        "http://localhost:4242/success.html?session_id={CHECKOUT_SESSION_ID}"
    );
    assert_eq!(args[4], "http://localhost:4242/canceled.html");
}

#[tokio::test]
async fn create_session_surfaces_provider_message() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();
    mock.set_method_error(
        "create_checkout_session",
        PaymentError::new(
            PaymentErrorCode::InvalidRequest,
            "The payment method type \"bacs_debit\" is invalid.",
        ),
    );

    let response = build_app(&mock, &dir)
        .oneshot(post("/create-checkout-session", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("bacs_debit"));
}

// =============================================================================
// GET /checkout-session
// =============================================================================

#[tokio::test]
async fn checkout_session_passes_object_through() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();
    let object = serde_json::json!({
        "id": "cs_test_known",
        "object": "checkout.session",
        "mode": "setup",
        "setup_intent": "seti_123",
        "customer": "cus_123",
    });
    mock.add_checkout_session(CheckoutSession {
        id: "cs_test_known".to_string(),
        mode: Some("setup".to_string()),
        customer_id: Some("cus_123".to_string()),
        status: Some("complete".to_string()),
        url: None,
        object: object.clone(),
    });

    let response = build_app(&mock, &dir)
        .oneshot(get("/checkout-session?sessionId=cs_test_known"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json, object);
}

#[tokio::test]
async fn checkout_session_without_id_is_bad_request() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir)
        .oneshot(get("/checkout-session"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_bytes(response).await.is_empty());
    assert_eq!(mock.call_count("get_checkout_session"), 0);
}

#[tokio::test]
async fn unknown_checkout_session_is_server_error() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir)
        .oneshot(get("/checkout-session?sessionId=cs_test_missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("cs_test_missing"));
}

// =============================================================================
// Static files and health
// =============================================================================

#[tokio::test]
async fn root_serves_index_html() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir).oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("Set up a payment method"));
}

#[tokio::test]
async fn unmatched_path_serves_static_file() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir)
        .oneshot(get("/success.html?session_id=cs_test_1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_static_file_is_not_found() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir)
        .oneshot(get("/nope.html"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthz_reports_ok() {
    let dir = client_dir();
    let mock = MockPaymentProvider::new();

    let response = build_app(&mock, &dir).oneshot(get("/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}
