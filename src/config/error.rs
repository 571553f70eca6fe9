//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host address")]
    InvalidHost,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid Stripe secret key format")]
    InvalidStripeKey,

    #[error("Invalid Stripe publishable key format")]
    InvalidPublishableKey,

    #[error("Invalid Stripe webhook secret format")]
    InvalidStripeWebhookSecret,

    #[error("Signature tolerance must be between 1 and 3600 seconds")]
    InvalidSignatureTolerance,

    #[error("Domain must be an absolute http(s) URL")]
    InvalidDomain,

    #[error("At least one payment method type is required")]
    NoPaymentMethodTypes,

    #[error("Webhook body limit must be greater than zero")]
    InvalidWebhookBodyLimit,
}
