//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Two naming schemes are accepted:
//!
//! - The conventional Stripe sample variables (`STRIPE_SECRET_KEY`,
//!   `STRIPE_PUBLISHABLE_KEY`, `STRIPE_WEBHOOK_SECRET`, `STATIC_DIR`, `DOMAIN`),
//!   loaded as defaults.
//! - Prefixed variables (`SETUP_CHECKOUT__<SECTION>__<KEY>`), which take precedence.
//!
//! # Example
//!
//! ```no_run
//! use setup_checkout::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod checkout;
mod error;
mod payment;
mod server;

pub use checkout::CheckoutConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Environment prefix for structured configuration keys.
const ENV_PREFIX: &str = "SETUP_CHECKOUT";

/// Flat variables used by the Stripe sample servers, mapped to config keys.
const CONVENTIONAL_ENV_KEYS: &[(&str, &str)] = &[
    ("STRIPE_SECRET_KEY", "payment.stripe_secret_key"),
    ("STRIPE_PUBLISHABLE_KEY", "payment.stripe_publishable_key"),
    ("STRIPE_WEBHOOK_SECRET", "payment.stripe_webhook_secret"),
    ("STATIC_DIR", "checkout.static_dir"),
    ("DOMAIN", "checkout.domain"),
];

/// Root application configuration
///
/// Built once at startup and shared read-only with every handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Payment configuration (Stripe keys)
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Checkout flow configuration (URLs, static assets, webhook limits)
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Seeds defaults from the conventional Stripe sample variables
    /// 3. Reads environment variables with `SETUP_CHECKOUT` prefix, `__` separated
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SETUP_CHECKOUT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SETUP_CHECKOUT__CHECKOUT__PAYMENT_METHOD_TYPES=bacs_debit,sepa_debit`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        for (var, key) in CONVENTIONAL_ENV_KEYS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(*key, value)?;
            }
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("checkout.payment_method_types"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.payment.validate()?;
        self.checkout.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
