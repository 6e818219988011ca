//! The credit ledger.
//!
//! Owns all balance mutation. Handlers never touch a profile's balance
//! directly; every adjustment goes through [`CreditLedger`], which in turn
//! delegates to the store's atomic primitives. The ledger itself never
//! reads a balance and writes it back.

use std::sync::Arc;

use quizforge_core::UserId;
use quizforge_store::{Store, StoreError};

/// Errors surfaced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The balance does not cover the requested debit. A normal,
    /// user-visible outcome, not a retryable error.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// No profile exists for the user. A consistency violation, fatal to
    /// the calling request.
    #[error("profile not found: {user_id}")]
    ProfileNotFound {
        /// The user whose profile is missing.
        user_id: UserId,
    },

    /// The store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Race-safe credit balance adjustments for one store.
#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn Store>,
}

impl CreditLedger {
    /// Create a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Debit `amount` credits if the balance covers it.
    ///
    /// Atomic with respect to concurrent debits and credits for the same
    /// user: of two concurrent debits that together exceed the balance,
    /// exactly one succeeds. Returns the balance after the debit.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientCredits`] if the balance is too low.
    /// - [`LedgerError::ProfileNotFound`] if the profile is missing.
    pub fn try_debit(&self, user_id: UserId, amount: i64) -> Result<i64, LedgerError> {
        match self.store.try_debit(&user_id, amount) {
            Ok(balance) => {
                tracing::debug!(user_id = %user_id, amount, balance, "debited credits");
                Ok(balance)
            }
            Err(e) => Err(Self::map_error(e, user_id)),
        }
    }

    /// Credit `amount` credits. No upper bound. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ProfileNotFound`] if the profile is missing.
    pub fn credit(&self, user_id: UserId, amount: i64) -> Result<i64, LedgerError> {
        match self.store.credit_balance(&user_id, amount) {
            Ok(balance) => {
                tracing::info!(user_id = %user_id, amount, balance, "credited balance");
                Ok(balance)
            }
            Err(e) => Err(Self::map_error(e, user_id)),
        }
    }

    /// Return `amount` credits after a failed downstream step.
    ///
    /// Mechanically identical to [`Self::credit`]; logged separately so
    /// refunds are distinguishable from purchases when reconciling.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ProfileNotFound`] if the profile is missing.
    pub fn refund(&self, user_id: UserId, amount: i64) -> Result<i64, LedgerError> {
        match self.store.credit_balance(&user_id, amount) {
            Ok(balance) => {
                tracing::info!(user_id = %user_id, amount, balance, "refunded credits");
                Ok(balance)
            }
            Err(e) => Err(Self::map_error(e, user_id)),
        }
    }

    fn map_error(err: StoreError, user_id: UserId) -> LedgerError {
        match err {
            StoreError::InsufficientCredits { balance, required } => {
                LedgerError::InsufficientCredits { balance, required }
            }
            StoreError::NotFound => LedgerError::ProfileNotFound { user_id },
            other => LedgerError::Storage(other.to_string()),
        }
    }
}
