//! Key encoding utilities for `RocksDB`.

use quizforge_core::{GenerationId, UserId};

/// Create a profile key from a user ID.
#[must_use]
pub fn profile_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a payment-event key from a checkout session id.
#[must_use]
pub fn payment_event_key(session_id: &str) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Create a generation key from a generation ID.
#[must_use]
pub fn generation_key(generation_id: &GenerationId) -> Vec<u8> {
    generation_id.to_bytes().to_vec()
}

/// Create a user-generation index key.
///
/// Format: `user_id (16 bytes) || generation_id (16 bytes)`
///
/// ULIDs are time-ordered, so a user's generations sort chronologically
/// under their prefix.
#[must_use]
pub fn user_generation_key(user_id: &UserId, generation_id: &GenerationId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&generation_id.to_bytes());
    key
}

/// Create a prefix for iterating all generations for a user.
#[must_use]
pub fn user_generations_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the generation ID from a user-generation index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_generation_id_from_user_key(key: &[u8]) -> GenerationId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    GenerationId::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_key_length() {
        let user_id = UserId::generate();
        assert_eq!(profile_key(&user_id).len(), 16);
    }

    #[test]
    fn user_generation_key_format() {
        let user_id = UserId::generate();
        let generation_id = GenerationId::generate();
        let key = user_generation_key(&user_id, &generation_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], generation_id.to_bytes());
    }

    #[test]
    fn extract_generation_id_roundtrip() {
        let user_id = UserId::generate();
        let generation_id = GenerationId::generate();
        let key = user_generation_key(&user_id, &generation_id);

        assert_eq!(extract_generation_id_from_user_key(&key), generation_id);
    }

    #[test]
    fn payment_event_key_is_session_id_bytes() {
        assert_eq!(payment_event_key("cs_123"), b"cs_123".to_vec());
    }
}
