//! Setup Checkout - Stripe setup-mode checkout server
//!
//! Serves a static client, creates checkout sessions that save a payment
//! method for later use, and receives signed Stripe webhooks.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
