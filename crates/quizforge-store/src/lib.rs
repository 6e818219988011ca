//! `RocksDB` storage layer for QuizForge.
//!
//! This crate provides persistent storage for profiles, payment events, and
//! generation records, using `RocksDB` column families. Two primitives are
//! load-bearing for the credit system and are implemented on a
//! transactional database with pessimistic locking:
//!
//! - **Conditional decrement** ([`Store::try_debit`]): check-and-decrement
//!   of a balance as one atomic operation. A read followed by a separate
//!   write would be a race under concurrent debits.
//! - **Unique insert** ([`Store::insert_payment_event`]): at most one
//!   payment event per checkout session, enforced at insert time so that
//!   concurrent deliveries of the same payment resolve to one winner.
//!
//! # Column families
//!
//! - `profiles`: credit balances, keyed by `user_id`
//! - `payment_events`: idempotency records, keyed by `session_id`
//! - `generations`: generation records, keyed by `generation_id` (ULID)
//! - `generations_by_user`: index for listing a user's generations

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use quizforge_core::{GenerationId, GenerationRecord, PaymentEvent, Profile, UserId};

/// The storage trait defining all database operations.
///
/// Abstracting the storage layer keeps the ledger and reconciler testable
/// against alternative implementations.
pub trait Store: Send + Sync {
    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// Insert or replace a profile record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_profile(&self, profile: &Profile) -> Result<()>;

    /// Get a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>>;

    /// Delete a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the profile doesn't exist.
    fn delete_profile(&self, user_id: &UserId) -> Result<()>;

    /// Atomically debit the balance if it covers `amount`.
    ///
    /// The check and the decrement execute as one transaction; concurrent
    /// debits of the same profile serialize, and at most one of two
    /// competing debits can spend the same credits. Returns the balance
    /// after the debit.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the profile doesn't exist.
    /// - `StoreError::InsufficientCredits` if the balance is below `amount`;
    ///   nothing is written.
    fn try_debit(&self, user_id: &UserId, amount: i64) -> Result<i64>;

    /// Atomically credit the balance. No upper bound. Safe to call
    /// concurrently with `try_debit` and with itself. Returns the balance
    /// after the credit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the profile doesn't exist.
    fn credit_balance(&self, user_id: &UserId, amount: i64) -> Result<i64>;

    // =========================================================================
    // Payment Event Operations (idempotency)
    // =========================================================================

    /// Insert a payment event, enforcing uniqueness on `session_id`.
    ///
    /// Exactly one of any number of concurrent inserts for the same
    /// session succeeds; the rest observe `DuplicateEvent`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEvent` if an event for this session
    /// already exists.
    fn insert_payment_event(&self, event: &PaymentEvent) -> Result<()>;

    /// Get a payment event by checkout session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_payment_event(&self, session_id: &str) -> Result<Option<PaymentEvent>>;

    /// Delete a payment event.
    ///
    /// Used only as the compensating rollback when crediting fails after a
    /// speculative insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_payment_event(&self, session_id: &str) -> Result<()>;

    // =========================================================================
    // Generation Operations
    // =========================================================================

    /// Insert a generation record, maintaining the user index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_generation(&self, record: &GenerationRecord) -> Result<()>;

    /// Get a generation record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_generation(&self, generation_id: &GenerationId) -> Result<Option<GenerationRecord>>;

    /// Delete a generation record and its index entry.
    ///
    /// Used only as a compensating action.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_generation(&self, record: &GenerationRecord) -> Result<()>;

    /// List a user's generations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_generations_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<GenerationRecord>>;
}
