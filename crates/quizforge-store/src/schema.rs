//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Profile records, keyed by `user_id`.
    pub const PROFILES: &str = "profiles";

    /// Payment idempotency records, keyed by checkout `session_id`.
    pub const PAYMENT_EVENTS: &str = "payment_events";

    /// Generation records, keyed by `generation_id` (ULID).
    pub const GENERATIONS: &str = "generations";

    /// Index: generations by user, keyed by `user_id || generation_id`.
    /// Value is empty (index only).
    pub const GENERATIONS_BY_USER: &str = "generations_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::PROFILES,
        cf::PAYMENT_EVENTS,
        cf::GENERATIONS,
        cf::GENERATIONS_BY_USER,
    ]
}
