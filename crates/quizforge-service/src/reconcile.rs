//! The payment reconciler.
//!
//! A completed payment may be announced more than once: the processor
//! redelivers webhooks, and the user's browser redirect races the webhook
//! for the same checkout session. The reconciler turns any number of
//! deliveries, on either channel, into exactly one ledger credit.
//!
//! Strategy: insert-first. The payment-event row is claimed before the
//! credit is granted, relying on the store's unique insert to pick one
//! winner among concurrent deliveries. If the credit then fails, the
//! speculative row is deleted so a later delivery can retry; an orphaned
//! row with no credit is easy to detect and repair, unlike a credit with
//! no row.

use std::sync::Arc;

use quizforge_core::{PaymentEvent, PaymentSource, UserId};
use quizforge_store::{Store, StoreError};

use crate::ledger::CreditLedger;

/// What a reconcile call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// This call performed the credit.
    pub credited: bool,

    /// Another delivery already claimed the session; nothing was granted.
    /// Callers must treat this as success, not an error.
    pub already_processed: bool,
}

/// Errors surfaced by reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// No profile exists for the paying user. A consistency violation:
    /// the payment references an account the store has never seen.
    #[error("profile not found for user {user_id}")]
    ProfileNotFound {
        /// The user the payment names.
        user_id: UserId,
    },

    /// The event row was claimed but the credit could not be granted.
    /// The row has been rolled back (or flagged if the rollback failed),
    /// so a redelivery can retry.
    #[error("credit failed: {0}")]
    CreditFailed(String),

    /// The store failed before the idempotency slot was claimed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Grants credits exactly once per completed checkout session.
#[derive(Clone)]
pub struct PaymentReconciler {
    store: Arc<dyn Store>,
    ledger: CreditLedger,
}

impl PaymentReconciler {
    /// Create a reconciler over the given store and ledger.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, ledger: CreditLedger) -> Self {
        Self { store, ledger }
    }

    /// Process one payment-completion notification.
    ///
    /// Safe to call any number of times, concurrently or sequentially,
    /// with the same `session_id`: exactly one call credits the balance
    /// and the rest report `already_processed`. Authenticity of the
    /// notification (webhook signature, session-status lookup, payer
    /// identity) is the calling channel's responsibility.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::ProfileNotFound`] if the paying user has no
    ///   profile.
    /// - [`ReconcileError::CreditFailed`] if the slot was claimed but the
    ///   credit could not be granted (the slot is released again).
    pub fn reconcile(
        &self,
        session_id: &str,
        user_id: UserId,
        amount: i64,
        source: PaymentSource,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        // The payment must name a profile we know; crediting into the void
        // is a consistency violation, not a retryable condition.
        let profile = self
            .store
            .get_profile(&user_id)
            .map_err(|e| ReconcileError::Storage(e.to_string()))?;
        if profile.is_none() {
            tracing::error!(
                user_id = %user_id,
                session_id = %session_id,
                amount,
                step = "lookup_profile",
                "payment references a user with no profile"
            );
            return Err(ReconcileError::ProfileNotFound { user_id });
        }

        // Claim the idempotency slot. The unique insert picks one winner
        // among concurrent deliveries on both channels.
        let event = PaymentEvent::new(session_id, user_id, amount, source);
        match self.store.insert_payment_event(&event) {
            Ok(()) => {}
            Err(StoreError::DuplicateEvent { .. }) => {
                tracing::info!(
                    user_id = %user_id,
                    session_id = %session_id,
                    source = ?source,
                    "payment already processed, skipping credit"
                );
                return Ok(ReconcileOutcome {
                    credited: false,
                    already_processed: true,
                });
            }
            Err(e) => return Err(ReconcileError::Storage(e.to_string())),
        }

        match self.ledger.credit(user_id, amount) {
            Ok(balance) => {
                tracing::info!(
                    user_id = %user_id,
                    session_id = %session_id,
                    amount,
                    balance,
                    source = ?source,
                    "payment credited"
                );
                Ok(ReconcileOutcome {
                    credited: true,
                    already_processed: false,
                })
            }
            Err(e) => {
                // Release the slot so the processor's redelivery can retry.
                if let Err(rollback) = self.store.delete_payment_event(session_id) {
                    tracing::error!(
                        user_id = %user_id,
                        session_id = %session_id,
                        amount,
                        step = "rollback_event",
                        credit_error = %e,
                        rollback_error = %rollback,
                        "reconciliation discrepancy: credit failed and event row could not be removed"
                    );
                }
                Err(ReconcileError::CreditFailed(e.to_string()))
            }
        }
    }
}
