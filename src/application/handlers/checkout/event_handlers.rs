//! Webhook event handlers for the setup checkout flow.
//!
//! One handler per recognised event tag, plus `default_dispatcher` which
//! registers all of them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::checkout::{EventDispatcher, HandlerOutcome, WebhookError, WebhookEventHandler};
use crate::ports::{PaymentProvider, WebhookEvent, WebhookEventData};

/// Build a dispatcher with every built-in handler registered.
pub fn default_dispatcher(
    payment_provider: Arc<dyn PaymentProvider>,
    featured_item: impl Into<String>,
) -> EventDispatcher {
    EventDispatcher::new()
        .register(
            WebhookEventData::CHECKOUT_SESSION_COMPLETED,
            Arc::new(CheckoutCompletedHandler::new(payment_provider, featured_item)),
        )
        .register(WebhookEventData::MANDATE_UPDATED, Arc::new(MandateUpdatedHandler))
        .register(
            WebhookEventData::PAYMENT_METHOD_AUTOMATICALLY_UPDATED,
            Arc::new(PaymentMethodUpdatedHandler),
        )
}

fn unexpected_payload(event: &WebhookEvent, expected: &str) -> WebhookError {
    WebhookError::ParseError(format!(
        "Event {} carries {} data, expected {}",
        event.id,
        event.event_type(),
        expected
    ))
}

/// Handles `checkout.session.completed`.
///
/// Looks up the customer and reports whether the featured item was bought
/// alongside the payment method setup.
pub struct CheckoutCompletedHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    featured_item: String,
}

impl CheckoutCompletedHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, featured_item: impl Into<String>) -> Self {
        Self {
            payment_provider,
            featured_item: featured_item.into(),
        }
    }
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<HandlerOutcome, WebhookError> {
        let WebhookEventData::CheckoutSessionCompleted(checkout) = &event.data else {
            return Err(unexpected_payload(event, WebhookEventData::CHECKOUT_SESSION_COMPLETED));
        };

        tracing::info!(
            event_id = %event.id,
            session_id = %checkout.session_id,
            mode = ?checkout.mode,
            "Checkout session completed"
        );

        let Some(customer_id) = checkout.customer_id.as_deref().filter(|id| !id.is_empty()) else {
            tracing::info!(session_id = %checkout.session_id, "Completed session has no customer");
            return Ok(HandlerOutcome::NoCustomer);
        };

        let customer = self
            .payment_provider
            .get_customer(customer_id)
            .await
            .map_err(|e| WebhookError::CustomerLookup(e.to_string()))?
            .ok_or_else(|| {
                WebhookError::CustomerLookup(format!("Customer {} not found", customer_id))
            })?;

        if checkout.has_custom_item(&self.featured_item) {
            tracing::info!(
                customer_id = %customer.id,
                item = %self.featured_item,
                "Customer subscribed and purchased"
            );
            Ok(HandlerOutcome::SubscribedAndPurchased {
                customer_id: customer.id,
            })
        } else {
            tracing::info!(customer_id = %customer.id, "Customer subscribed only");
            Ok(HandlerOutcome::SubscribedOnly {
                customer_id: customer.id,
            })
        }
    }
}

/// Handles `mandate.updated`.
pub struct MandateUpdatedHandler;

#[async_trait]
impl WebhookEventHandler for MandateUpdatedHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<HandlerOutcome, WebhookError> {
        let WebhookEventData::MandateUpdated(mandate) = &event.data else {
            return Err(unexpected_payload(event, WebhookEventData::MANDATE_UPDATED));
        };

        tracing::info!(
            event_id = %event.id,
            mandate_id = %mandate.mandate_id,
            status = ?mandate.status,
            payment_method_id = ?mandate.payment_method_id,
            "Mandate updated"
        );
        Ok(HandlerOutcome::Logged)
    }
}

/// Handles `payment_method.automatically_updated`.
pub struct PaymentMethodUpdatedHandler;

#[async_trait]
impl WebhookEventHandler for PaymentMethodUpdatedHandler {
    async fn handle(&self, event: &WebhookEvent) -> Result<HandlerOutcome, WebhookError> {
        let WebhookEventData::PaymentMethodAutomaticallyUpdated(method) = &event.data else {
            return Err(unexpected_payload(
                event,
                WebhookEventData::PAYMENT_METHOD_AUTOMATICALLY_UPDATED,
            ));
        };

        tracing::info!(
            event_id = %event.id,
            payment_method_id = %method.payment_method_id,
            method_type = ?method.method_type,
            customer_id = ?method.customer_id,
            "Payment method automatically updated"
        );
        Ok(HandlerOutcome::Logged)
    }
}
