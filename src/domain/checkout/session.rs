//! Setup-mode checkout session policy.
//!
//! Turns the checkout configuration plus an optional customer and locale
//! into the request sent to the payment provider.

use crate::config::CheckoutConfig;
use crate::ports::{CreateCheckoutRequest, SessionMode};

/// Literal placeholder the provider substitutes with the session ID.
pub const CHECKOUT_SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

const SUCCESS_PAGE: &str = "/success.html";
const CANCEL_PAGE: &str = "/canceled.html";

/// How setup sessions are built for this deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupSessionPolicy {
    base_url: String,
    payment_method_types: Vec<String>,
    create_customer_when_missing: bool,
}

impl SetupSessionPolicy {
    pub fn new(
        base_url: impl Into<String>,
        payment_method_types: Vec<String>,
        create_customer_when_missing: bool,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            payment_method_types,
            create_customer_when_missing,
        }
    }

    pub fn from_config(config: &CheckoutConfig) -> Self {
        let types = config
            .payment_method_types
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(config.base_url(), types, config.create_customer_when_missing)
    }

    /// Redirect target after a completed setup. Keeps the placeholder unescaped.
    pub fn success_url(&self) -> String {
        format!(
            "{}{}?session_id={}",
            self.base_url, SUCCESS_PAGE, CHECKOUT_SESSION_ID_PLACEHOLDER
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, CANCEL_PAGE)
    }

    pub fn payment_method_types(&self) -> &[String] {
        &self.payment_method_types
    }

    /// Whether a customer must be created before the session.
    pub fn needs_customer(&self, customer_id: Option<&str>) -> bool {
        self.create_customer_when_missing && customer_id.map_or(true, str::is_empty)
    }

    /// Build the provider request for a setup session.
    pub fn build_request(
        &self,
        customer_id: Option<String>,
        locale: Option<String>,
    ) -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            customer_id: customer_id.filter(|id| !id.is_empty()),
            payment_method_types: self.payment_method_types.clone(),
            mode: SessionMode::Setup,
            success_url: self.success_url(),
            cancel_url: self.cancel_url(),
            locale: locale.filter(|l| !l.is_empty()),
        }
    }
}
