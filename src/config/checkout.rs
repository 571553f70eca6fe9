//! Checkout flow configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Checkout configuration: redirect URLs, static assets and webhook limits.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    /// Public origin used to build success/cancel redirect URLs.
    #[serde(default)]
    pub domain: String,

    /// Directory served for `/` and any unmatched path.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Payment method types offered by the checkout session.
    #[serde(default = "default_payment_method_types")]
    pub payment_method_types: Vec<String>,

    /// Create a fresh customer when the caller does not supply one.
    #[serde(default = "default_true")]
    pub create_customer_when_missing: bool,

    /// Custom line item that marks a purchase on top of the setup.
    #[serde(default = "default_featured_item")]
    pub featured_item_name: String,

    /// Largest webhook body accepted before verification, in bytes.
    #[serde(default = "default_webhook_max_body_bytes")]
    pub webhook_max_body_bytes: usize,
}

impl CheckoutConfig {
    /// Domain without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.domain.trim_end_matches('/')
    }

    /// Validate checkout configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.domain.is_empty() {
            return Err(ValidationError::MissingRequired("DOMAIN"));
        }
        if !self.domain.starts_with("http://") && !self.domain.starts_with("https://") {
            return Err(ValidationError::InvalidDomain);
        }
        if self.static_dir.is_empty() {
            return Err(ValidationError::MissingRequired("STATIC_DIR"));
        }
        if self.payment_method_types.iter().all(|t| t.trim().is_empty()) {
            return Err(ValidationError::NoPaymentMethodTypes);
        }
        if self.webhook_max_body_bytes == 0 {
            return Err(ValidationError::InvalidWebhookBodyLimit);
        }
        Ok(())
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            static_dir: default_static_dir(),
            payment_method_types: default_payment_method_types(),
            create_customer_when_missing: true,
            featured_item_name: default_featured_item(),
            webhook_max_body_bytes: default_webhook_max_body_bytes(),
        }
    }
}

fn default_static_dir() -> String {
    "../client".to_string()
}

fn default_payment_method_types() -> Vec<String> {
    vec!["bacs_debit".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_featured_item() -> String {
    "e-book".to_string()
}

fn default_webhook_max_body_bytes() -> usize {
    65536
}
