//! Webhook event dispatch.
//!
//! Verified events are routed by type tag to a registered handler.
//! Tags without a handler are acknowledged and ignored; handler failures
//! are logged and acknowledged as well, since the event itself was valid.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::errors::WebhookError;
use crate::ports::WebhookEvent;

/// Handler for one webhook event type.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Handles the event. Errors are reported but never fail the delivery.
    async fn handle(&self, event: &WebhookEvent) -> Result<HandlerOutcome, WebhookError>;
}

/// What a handler concluded about an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Event recorded in the log only.
    Logged,
    /// Customer set up a payment method and bought the featured item.
    SubscribedAndPurchased { customer_id: String },
    /// Customer set up a payment method without the featured item.
    SubscribedOnly { customer_id: String },
    /// Completed session carried no customer to look up.
    NoCustomer,
}

/// Result of routing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled {
        event_type: String,
        outcome: HandlerOutcome,
    },
    Ignored {
        event_type: String,
    },
    Failed {
        event_type: String,
        reason: String,
    },
}

impl DispatchOutcome {
    pub fn event_type(&self) -> &str {
        match self {
            DispatchOutcome::Handled { event_type, .. }
            | DispatchOutcome::Ignored { event_type }
            | DispatchOutcome::Failed { event_type, .. } => event_type,
        }
    }
}

/// Registry of handlers keyed by event type tag.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: HashMap<String, Arc<dyn WebhookEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a tag, replacing any previous one.
    pub fn register(
        mut self,
        event_type: impl Into<String>,
        handler: Arc<dyn WebhookEventHandler>,
    ) -> Self {
        self.handlers.insert(event_type.into(), handler);
        self
    }

    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Route an event to its handler.
    pub async fn dispatch(&self, event: &WebhookEvent) -> DispatchOutcome {
        let event_type = event.event_type().to_string();

        let Some(handler) = self.handlers.get(&event_type) else {
            tracing::debug!(event_id = %event.id, event_type = %event_type, "Unhandled event type");
            return DispatchOutcome::Ignored { event_type };
        };

        match handler.handle(event).await {
            Ok(outcome) => DispatchOutcome::Handled {
                event_type,
                outcome,
            },
            Err(err) => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event_type,
                    error = %err,
                    "Webhook handler failed"
                );
                DispatchOutcome::Failed {
                    event_type,
                    reason: err.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&String> = self.handlers.keys().collect();
        tags.sort();
        f.debug_struct("EventDispatcher").field("handlers", &tags).finish()
    }
}
