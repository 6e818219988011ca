//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use quizforge_core::{
    UserId, CREDITS_PER_PURCHASE, CREDIT_PACK_PRICE_CENTS, CREDIT_PACK_PRODUCT_NAME,
};

use super::types::{CheckoutSession, StripeErrorResponse, METADATA_USER_ID};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
///
/// Talks to the checkout-session endpoints and verifies webhook
/// signatures. One product exists: the fixed credit pack.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `webhook_secret` - Optional webhook signing secret (`whsec_...`)
    /// * `base_url` - API base URL (overridden in tests)
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            webhook_secret,
        }
    }

    /// Create a Checkout session for the credit pack.
    ///
    /// The user id travels in the session metadata and comes back on both
    /// notification channels; it is how the webhook attributes the payment
    /// without an authenticated session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_checkout_session(
        &self,
        user_id: &UserId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let params: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), success_url.to_string()),
            ("cancel_url".into(), cancel_url.to_string()),
            (
                "line_items[0][price_data][currency]".into(),
                "usd".into(),
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                CREDIT_PACK_PRODUCT_NAME.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                CREDIT_PACK_PRICE_CENTS.to_string(),
            ),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                format!("metadata[{METADATA_USER_ID}]"),
                user_id.to_string(),
            ),
        ];

        tracing::debug!(
            user_id = %user_id,
            credits = CREDITS_PER_PURCHASE,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Retrieve a Checkout session by ID (client-return status lookup).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.base_url, session_id))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Verify a webhook signature header against the raw payload.
    ///
    /// The header has the form `t=<timestamp>,v1=<sig>[,v1=<sig>...]`; the
    /// expected signature is HMAC-SHA256 of `"{timestamp}.{payload}"` under
    /// the webhook secret. Comparison is constant-time.
    ///
    /// # Errors
    ///
    /// - `StripeError::Configuration` if no webhook secret is configured
    ///   or the header carries no timestamp.
    /// - `StripeError::InvalidSignature` if no candidate signature matches.
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<(), StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| StripeError::Configuration("Webhook secret not configured".into()))?;

        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature.split(',') {
            let mut kv = part.splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("t"), Some(ts)) => timestamp = Some(ts),
                (Some("v1"), Some(sig)) => signatures.push(sig),
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| StripeError::Configuration("Missing timestamp".into()))?;

        if signatures.is_empty() {
            return Err(StripeError::InvalidSignature);
        }

        let signed_payload = format!("{timestamp}.{payload}");
        let expected = compute_hmac_sha256(secret, &signed_payload);

        let valid = signatures.iter().any(|sig| constant_time_eq(&expected, sig));

        if valid {
            Ok(())
        } else {
            Err(StripeError::InvalidSignature)
        }
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

/// HMAC block size for SHA256 is 64 bytes.
const HMAC_BLOCK_SIZE: usize = 64;

/// Compute HMAC-SHA256 and return hex-encoded result.
fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use sha2::{Digest, Sha256};

    let key = secret.as_bytes();
    let message = message.as_bytes();

    // Keys longer than the block size are hashed down first
    let key = if key.len() > HMAC_BLOCK_SIZE {
        let mut hasher = Sha256::new();
        hasher.update(key);
        hasher.finalize().to_vec()
    } else {
        key.to_vec()
    };

    let mut key_padded = [0u8; HMAC_BLOCK_SIZE];
    key_padded[..key.len()].copy_from_slice(&key);

    let mut i_key_pad = [0x36u8; HMAC_BLOCK_SIZE];
    let mut o_key_pad = [0x5cu8; HMAC_BLOCK_SIZE];

    for i in 0..HMAC_BLOCK_SIZE {
        i_key_pad[i] ^= key_padded[i];
        o_key_pad[i] ^= key_padded[i];
    }

    let mut inner_hasher = Sha256::new();
    inner_hasher.update(i_key_pad);
    inner_hasher.update(message);
    let inner_hash = inner_hasher.finalize();

    let mut outer_hasher = Sha256::new();
    outer_hasher.update(o_key_pad);
    outer_hasher.update(inner_hash);
    let hmac = outer_hasher.finalize();

    hex::encode(hmac)
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
