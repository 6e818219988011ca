//! Payment event types.
//!
//! A `PaymentEvent` is the durable idempotency record for one completed
//! checkout session. At most one row ever exists per `session_id`; the row
//! is the single source of truth for "has this payment already been
//! credited".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// The channel through which a payment notification first arrived.
///
/// The webhook is the durable source of truth; the client-return channel
/// is best-effort and may never fire. Neither channel is ordered relative
/// to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    /// Signed webhook delivery from the payment processor.
    Webhook,

    /// The user's browser returning from checkout.
    ClientReturn,
}

/// Idempotency record for one completed checkout session.
///
/// Created exactly once, by whichever channel wins the insert race. Deleted
/// only as a compensating rollback when crediting fails after the row was
/// written speculatively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Checkout session id assigned by the payment processor. Unique per
    /// checkout attempt and present on every delivery of the same event,
    /// which is what makes it the idempotency key.
    pub session_id: String,

    /// The user whose balance the payment credits.
    pub user_id: UserId,

    /// Credits granted by this payment.
    pub amount: i64,

    /// The channel that first recorded the event.
    pub source: PaymentSource,

    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl PaymentEvent {
    /// Create a new payment event stamped with the current time.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        user_id: UserId,
        amount: i64,
        source: PaymentSource,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id,
            amount,
            source,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_source_serde_tags() {
        assert_eq!(
            serde_json::to_string(&PaymentSource::Webhook).unwrap(),
            "\"webhook\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentSource::ClientReturn).unwrap(),
            "\"client_return\""
        );
    }

    #[test]
    fn event_roundtrip() {
        let event = PaymentEvent::new("cs_123", UserId::generate(), 10, PaymentSource::Webhook);
        let json = serde_json::to_string(&event).unwrap();
        let parsed: PaymentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id, "cs_123");
        assert_eq!(parsed.amount, 10);
        assert_eq!(parsed.source, PaymentSource::Webhook);
    }
}
