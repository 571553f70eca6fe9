//! CreateCheckoutSessionHandler - Command handler for starting a setup-mode checkout.

use std::sync::Arc;

use crate::domain::checkout::{CheckoutError, SetupSessionPolicy};
use crate::ports::{CheckoutSession, CreateCustomerRequest, PaymentProvider};

/// Command to create a checkout session.
#[derive(Debug, Clone, Default)]
pub struct CreateCheckoutSessionCommand {
    /// Existing customer to attach. A new one is created when absent.
    pub customer_id: Option<String>,
    /// Checkout page locale.
    pub locale: Option<String>,
}

/// Handler for creating setup-mode checkout sessions.
///
/// Creates a customer first when the command carries none and the policy
/// asks for one. Remote failures are returned unchanged.
pub struct CreateCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    policy: Arc<SetupSessionPolicy>,
}

impl CreateCheckoutSessionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, policy: Arc<SetupSessionPolicy>) -> Self {
        Self {
            payment_provider,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CheckoutSession, CheckoutError> {
        let customer_id = if self.policy.needs_customer(cmd.customer_id.as_deref()) {
            let customer = self
                .payment_provider
                .create_customer(CreateCustomerRequest::default())
                .await?;
            Some(customer.id)
        } else {
            cmd.customer_id
        };

        let request = self.policy.build_request(customer_id, cmd.locale);
        let session = self.payment_provider.create_checkout_session(request).await?;

        Ok(session)
    }
}
