//! GetCheckoutSessionHandler - Query handler for fetching a checkout session.

use std::sync::Arc;

use crate::domain::checkout::CheckoutError;
use crate::ports::{CheckoutSession, PaymentProvider};

/// Query to fetch a checkout session.
#[derive(Debug, Clone, Default)]
pub struct GetCheckoutSessionQuery {
    pub session_id: Option<String>,
}

/// Handler for fetching checkout sessions from the provider.
pub struct GetCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl GetCheckoutSessionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        query: GetCheckoutSessionQuery,
    ) -> Result<CheckoutSession, CheckoutError> {
        let session_id = query
            .session_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(CheckoutError::MissingParameter("sessionId"))?;

        let session = self
            .payment_provider
            .get_checkout_session(session_id.trim())
            .await?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::ports::{CreateCheckoutRequest, PaymentErrorCode, PaymentProvider, SessionMode};

    #[tokio::test]
    async fn missing_id_is_rejected_without_remote_call() {
        let mock = MockPaymentProvider::new();
        let handler = GetCheckoutSessionHandler::new(Arc::new(mock.clone()));

        for session_id in [None, Some(String::new()), Some("  ".to_string())] {
            let err = handler
                .handle(GetCheckoutSessionQuery { session_id })
                .await
                .unwrap_err();
            assert!(matches!(err, CheckoutError::MissingParameter("sessionId")));
        }
        assert!(!mock.was_called("get_checkout_session"));
    }

    #[tokio::test]
    async fn returns_remote_object_unmodified() {
        let mock = MockPaymentProvider::new();
        let created = mock
            .create_checkout_session(CreateCheckoutRequest {
                customer_id: Some("cus_1".to_string()),
                payment_method_types: vec!["bacs_debit".to_string()],
                mode: SessionMode::Setup,
                success_url: "http://x/success.html".to_string(),
                cancel_url: "http://x/canceled.html".to_string(),
                locale: None,
            })
            .await
            .unwrap();
        let handler = GetCheckoutSessionHandler::new(Arc::new(mock));

        let fetched = handler
            .handle(GetCheckoutSessionQuery {
                session_id: Some(created.id.clone()),
            })
            .await
            .unwrap();

        assert_eq!(fetched.object, created.object);
    }

    #[tokio::test]
    async fn remote_failure_is_surfaced() {
        let handler = GetCheckoutSessionHandler::new(Arc::new(MockPaymentProvider::new()));

        let err = handler
            .handle(GetCheckoutSessionQuery {
                session_id: Some("cs_unknown".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Remote(ref e) if e.code == PaymentErrorCode::NotFound));
    }
}
