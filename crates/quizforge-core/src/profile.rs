//! User profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A user's credit profile.
///
/// `credits` is never observed below zero by any reader. Handlers never
/// write this struct's balance directly; all mutation goes through the
/// store's atomic debit/credit primitives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// The user ID (from the auth provider).
    pub user_id: UserId,

    /// Current credit balance.
    pub credits: i64,

    /// When the profile was created.
    pub created_at: DateTime<Utc>,

    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new profile with the given starting balance.
    #[must_use]
    pub fn new(user_id: UserId, starting_credits: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            credits: starting_credits,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the balance covers a debit of `amount`.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount: i64) -> bool {
        self.credits >= amount
    }
}
