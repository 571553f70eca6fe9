use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use setup_checkout::adapters::{checkout_app, CheckoutAppState, StripeConfig, StripePaymentAdapter};
use setup_checkout::config::{AppConfig, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_validated().context("invalid configuration")?;

    init_tracing(&config);

    let provider = StripePaymentAdapter::new(StripeConfig::from_payment_config(&config.payment));
    let state = CheckoutAppState::new(&config, Arc::new(provider));
    let app = checkout_app(
        state,
        &config.checkout.static_dir,
        &config.server.cors_origins_list(),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        static_dir = %config.checkout.static_dir,
        test_mode = config.payment.is_test_mode(),
        "Checkout server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    match config.server.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
