//! Axum router configuration for checkout endpoints.

use std::path::Path;

use axum::routing::{get, post};
use axum::Router;
use http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_checkout_session, get_checkout_session, get_config, handle_webhook, healthz,
    CheckoutAppState, STRIPE_SIGNATURE,
};

/// Create the checkout API router.
///
/// # Routes
///
/// - `GET /config` - Publishable key
/// - `POST /create-checkout-session` - Start a setup-mode session
/// - `GET /checkout-session?sessionId=` - Fetch a session
/// - `POST /webhook` - Stripe events (signature verified)
/// - `GET /healthz` - Liveness probe
pub fn checkout_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/config", get(get_config))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/checkout-session", get(get_checkout_session))
        .route("/webhook", post(handle_webhook))
        .route("/healthz", get(healthz))
}

/// Build the complete application: API routes, static files for every
/// other path, request tracing, and CORS when origins are configured.
pub fn checkout_app(
    state: CheckoutAppState,
    static_dir: impl AsRef<Path>,
    cors_origins: &[String],
) -> Router {
    let app = checkout_routes()
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_origins.is_empty() {
        app
    } else {
        app.layer(cors_layer(cors_origins))
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(STRIPE_SIGNATURE),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::config::AppConfig;
    use crate::ports::PaymentError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.payment.stripe_publishable_key = "pk_test_123".to_string();
        config.checkout.domain = "http://localhost:4242".to_string();
        config
    }

    fn test_app(mock: &MockPaymentProvider) -> Router {
        let state = CheckoutAppState::new(&test_config(), Arc::new(mock.clone()));
        checkout_routes().with_state(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Route Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn config_returns_public_key() {
        let mock = MockPaymentProvider::new();
        let response = test_app(&mock)
            .oneshot(Request::builder().uri("/config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"publicKey": "pk_test_123"})
        );
    }

    #[tokio::test]
    async fn config_rejects_post() {
        let mock = MockPaymentProvider::new();
        let response = test_app(&mock)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn create_session_without_body_creates_customer() {
        let mock = MockPaymentProvider::new();
        let response = test_app(&mock)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create-checkout-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["sessionId"].as_str().unwrap().starts_with("cs_test"));
        assert!(mock.was_called("create_customer"));
    }

    #[tokio::test]
    async fn create_session_forwards_customer_and_locale() {
        let mock = MockPaymentProvider::new();
        let response = test_app(&mock)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create-checkout-session")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"customerId":"cus_123","locale":"fr"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!mock.was_called("create_customer"));
        let args = mock.last_args("create_checkout_session").unwrap();
        assert_eq!(args[0], "cus_123");
        assert_eq!(args[5], "fr");
    }

    #[tokio::test]
    async fn checkout_session_returns_stored_object() {
        let mock = MockPaymentProvider::new();
        let app = test_app(&mock);

        let created = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create-checkout-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let session_id = body_json(created).await["sessionId"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/checkout-session?sessionId={}", session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["id"], session_id.as_str());
        assert_eq!(json["mode"], "setup");
    }

    #[tokio::test]
    async fn checkout_session_requires_session_id() {
        let mock = MockPaymentProvider::new();
        let response = test_app(&mock)
            .oneshot(
                Request::builder()
                    .uri("/checkout-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!mock.was_called("get_checkout_session"));
    }

    #[tokio::test]
    async fn provider_failure_maps_to_server_error() {
        let mock = MockPaymentProvider::new();
        mock.set_method_error(
            "create_customer",
            PaymentError::provider("Stripe is unavailable"),
        );

        let response = test_app(&mock)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create-checkout-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!mock.was_called("create_checkout_session"));
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let mock = MockPaymentProvider::new();
        let response = test_app(&mock)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let mock = MockPaymentProvider::new();
        let state = CheckoutAppState::new(&test_config(), Arc::new(mock));
        let app = checkout_app(
            state,
            "does-not-exist",
            &["http://localhost:3000".to_string()],
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/config")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "http://localhost:3000"
        );
    }
}
