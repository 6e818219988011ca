//! Stripe API types (the subset this service consumes).

use std::collections::HashMap;

use serde::Deserialize;

/// Metadata key carrying our user id on a checkout session.
pub const METADATA_USER_ID: &str = "userId";

/// A Stripe Checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id (`cs_...`); the payment idempotency key.
    pub id: String,

    /// Hosted checkout URL (present on newly created sessions).
    #[serde(default)]
    pub url: Option<String>,

    /// Payment status (`"paid"`, `"unpaid"`, `"no_payment_required"`).
    #[serde(default)]
    pub payment_status: Option<String>,

    /// Session metadata; carries [`METADATA_USER_ID`].
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Whether the session's payment has completed.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    /// The user id recorded in the session metadata, if any.
    #[must_use]
    pub fn metadata_user_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_USER_ID).map(String::as_str)
    }
}

/// Error response envelope from the Stripe API.
#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    /// The error payload.
    pub error: StripeErrorBody,
}

/// Error payload from the Stripe API.
#[derive(Debug, Deserialize)]
pub struct StripeErrorBody {
    /// Error category.
    #[serde(rename = "type")]
    pub error_type: String,

    /// Human-readable message.
    pub message: String,

    /// Machine-readable error code, when present.
    #[serde(default)]
    pub code: Option<String>,
}
