//! Stripe webhook signature verification.
//!
//! `HMAC-SHA256(secret, "{t}.{payload}")` compared in constant time against
//! every `v1` entry of the `Stripe-Signature` header, with a replay window
//! on `t`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

use super::webhook_types::SignatureHeader;
use crate::ports::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Default maximum age for webhook events (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Verifies `Stripe-Signature` headers against a signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Override the maximum event age.
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub fn tolerance_secs(&self) -> i64 {
        self.tolerance_secs
    }

    /// Verify a raw header against the payload using the current clock.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<SignatureHeader, PaymentError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// Verify against an explicit `now`.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<SignatureHeader, PaymentError> {
        let header = SignatureHeader::parse(header).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            PaymentError::invalid_webhook(e.to_string())
        })?;

        // 1. Replay window
        let age = now.checked_sub(header.timestamp).ok_or_else(|| {
            tracing::warn!(event_timestamp = header.timestamp, "Webhook timestamp out of range");
            PaymentError::invalid_webhook("Invalid timestamp")
        })?;
        if age > self.tolerance_secs {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(PaymentError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }
        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(PaymentError::invalid_webhook("Event timestamp in future"));
        }

        // 2. Any v1 may match; every candidate is compared
        let expected = self.compute(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .fold(Choice::from(0), |acc, candidate| {
                acc | expected.as_slice().ct_eq(candidate.as_slice())
            });

        if matched.unwrap_u8() != 1 {
            tracing::warn!(
                candidates = header.v1_signatures.len(),
                "No matching webhook signature"
            );
            return Err(PaymentError::invalid_webhook(
                "No signatures found matching the expected signature for payload",
            ));
        }

        Ok(header)
    }

    /// Build a header value for `payload` signed at `timestamp`.
    ///
    /// Used by local tooling and tests to produce deliveries the server accepts.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, PaymentError> {
        let signature = self.compute(timestamp, payload)?;
        Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
    }

    fn compute(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, PaymentError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| PaymentError::invalid_webhook(format!("Unusable signing secret: {}", e)))?;

        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}
