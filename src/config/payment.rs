//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    #[serde(default)]
    pub stripe_secret_key: String,

    /// Stripe publishable key, handed to the browser via `/config`
    #[serde(default)]
    pub stripe_publishable_key: String,

    /// Stripe webhook signing secret
    #[serde(default)]
    pub stripe_webhook_secret: String,

    /// Override for the Stripe API base URL
    pub stripe_api_base_url: Option<String>,

    /// Reject test mode events
    #[serde(default)]
    pub require_livemode: bool,

    /// Maximum age of a webhook signature timestamp, in seconds
    pub signature_tolerance_secs: Option<i64>,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_secret_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_secret_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_SECRET_KEY"));
        }
        if self.stripe_publishable_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_PUBLISHABLE_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        if !self.stripe_secret_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_publishable_key.starts_with("pk_") {
            return Err(ValidationError::InvalidPublishableKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if let Some(tolerance) = self.signature_tolerance_secs {
            if !(1..=3600).contains(&tolerance) {
                return Err(ValidationError::InvalidSignatureTolerance);
            }
        }

        Ok(())
    }
}
