//! HandlePaymentWebhookHandler - Command handler for processing payment provider webhooks.

use std::sync::Arc;

use crate::domain::checkout::{DispatchOutcome, EventDispatcher, WebhookError};
use crate::ports::PaymentProvider;

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if present.
    pub signature: Option<String>,
}

/// Handler for processing payment provider webhooks.
///
/// Enforces the size cap, authenticates the delivery, then routes the event.
/// Once verification succeeds the result is always an acknowledgement.
pub struct HandlePaymentWebhookHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    dispatcher: Arc<EventDispatcher>,
    max_body_bytes: usize,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        dispatcher: Arc<EventDispatcher>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            payment_provider,
            dispatcher,
            max_body_bytes,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<DispatchOutcome, WebhookError> {
        // 1. Size guard, before anything looks at the payload
        if cmd.payload.len() > self.max_body_bytes {
            return Err(WebhookError::PayloadTooLarge {
                limit: self.max_body_bytes,
            });
        }

        // 2. Verify webhook signature and parse event
        let signature = cmd
            .signature
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let event = self
            .payment_provider
            .verify_webhook(&cmd.payload, &signature)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook verification failed");
                WebhookError::from_verification(e)
            })?;

        // 3. Route by type tag
        let outcome = self.dispatcher.dispatch(&event).await;

        tracing::debug!(
            event_id = %event.id,
            event_type = %outcome.event_type(),
            outcome = ?outcome,
            "Webhook processed"
        );

        Ok(outcome)
    }
}
