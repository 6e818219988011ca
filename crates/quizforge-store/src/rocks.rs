//! `RocksDB` storage implementation.
//!
//! Balance mutations and payment-event inserts run inside pessimistic
//! transactions (`get_for_update` takes a row lock until commit), which is
//! what gives the store its conditional-update and unique-insert
//! guarantees. Everything else uses plain reads and batched writes.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, IteratorMode, MultiThreaded, Options, TransactionDB,
    TransactionDBOptions, WriteBatchWithTransaction,
};

use quizforge_core::{GenerationId, GenerationRecord, PaymentEvent, Profile, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<TransactionDB<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = TransactionDB::open_cf_descriptors(
            &opts,
            &TransactionDBOptions::default(),
            path,
            cf_descriptors,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Adjust a profile's balance inside one pessimistic transaction.
    ///
    /// `guard` sees the locked balance and decides whether the write may
    /// proceed; returning an error aborts with nothing written.
    fn adjust_balance(
        &self,
        user_id: &UserId,
        delta: i64,
        guard: impl FnOnce(i64) -> Result<()>,
    ) -> Result<i64> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(user_id);

        let txn = self.db.transaction();
        let raw = txn
            .get_for_update_cf(&cf, &key, true)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .ok_or(StoreError::NotFound)?;

        let mut profile: Profile = Self::deserialize(&raw)?;
        guard(profile.credits)?;

        profile.credits += delta;
        profile.updated_at = chrono::Utc::now();

        let value = Self::serialize(&profile)?;
        txn.put_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(profile.credits)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Profile Operations
    // =========================================================================

    fn put_profile(&self, profile: &Profile) -> Result<()> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(&profile.user_id);
        let value = Self::serialize(profile)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_profile(&self, user_id: &UserId) -> Result<()> {
        let cf = self.cf(cf::PROFILES)?;
        let key = keys::profile_key(user_id);

        if self.get_profile(user_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn try_debit(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        self.adjust_balance(user_id, -amount, |balance| {
            if balance < amount {
                return Err(StoreError::InsufficientCredits {
                    balance,
                    required: amount,
                });
            }
            Ok(())
        })
    }

    fn credit_balance(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        self.adjust_balance(user_id, amount, |_| Ok(()))
    }

    // =========================================================================
    // Payment Event Operations
    // =========================================================================

    fn insert_payment_event(&self, event: &PaymentEvent) -> Result<()> {
        let cf = self.cf(cf::PAYMENT_EVENTS)?;
        let key = keys::payment_event_key(&event.session_id);

        // The row lock from get_for_update serializes concurrent inserts
        // for the same session: the loser blocks, then observes the
        // winner's row.
        let txn = self.db.transaction();
        let existing = txn
            .get_for_update_cf(&cf, &key, true)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if existing.is_some() {
            return Err(StoreError::DuplicateEvent {
                session_id: event.session_id.clone(),
            });
        }

        let value = Self::serialize(event)?;
        txn.put_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_payment_event(&self, session_id: &str) -> Result<Option<PaymentEvent>> {
        let cf = self.cf(cf::PAYMENT_EVENTS)?;
        let key = keys::payment_event_key(session_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_payment_event(&self, session_id: &str) -> Result<()> {
        let cf = self.cf(cf::PAYMENT_EVENTS)?;
        let key = keys::payment_event_key(session_id);

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Generation Operations
    // =========================================================================

    fn put_generation(&self, record: &GenerationRecord) -> Result<()> {
        let cf_gen = self.cf(cf::GENERATIONS)?;
        let cf_by_user = self.cf(cf::GENERATIONS_BY_USER)?;

        let gen_key = keys::generation_key(&record.id);
        let user_gen_key = keys::user_generation_key(&record.owner, &record.id);
        let value = Self::serialize(record)?;

        let mut batch = WriteBatchWithTransaction::<true>::default();
        batch.put_cf(&cf_gen, &gen_key, &value);
        batch.put_cf(&cf_by_user, &user_gen_key, []); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_generation(&self, generation_id: &GenerationId) -> Result<Option<GenerationRecord>> {
        let cf = self.cf(cf::GENERATIONS)?;
        let key = keys::generation_key(generation_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_generation(&self, record: &GenerationRecord) -> Result<()> {
        let cf_gen = self.cf(cf::GENERATIONS)?;
        let cf_by_user = self.cf(cf::GENERATIONS_BY_USER)?;

        let mut batch = WriteBatchWithTransaction::<true>::default();
        batch.delete_cf(&cf_gen, keys::generation_key(&record.id));
        batch.delete_cf(
            &cf_by_user,
            keys::user_generation_key(&record.owner, &record.id),
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_generations_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<GenerationRecord>> {
        let cf_by_user = self.cf(cf::GENERATIONS_BY_USER)?;
        let prefix = keys::user_generations_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULID keys iterate oldest-first under the prefix; collect and
        // reverse for newest-first listing.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }

        all_keys.reverse();

        let mut records = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if records.len() >= limit {
                break;
            }

            let generation_id = keys::extract_generation_id_from_user_key(&key);
            if let Some(record) = self.get_generation(&generation_id)? {
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_core::{GenerationPayload, PaymentSource, QuizQuestion};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn profile_with_credits(store: &RocksStore, credits: i64) -> UserId {
        let user_id = UserId::generate();
        store.put_profile(&Profile::new(user_id, credits)).unwrap();
        user_id
    }

    fn quiz_record(owner: UserId, title: &str) -> GenerationRecord {
        let payload = GenerationPayload::Quiz {
            questions: vec![QuizQuestion {
                question: "q".into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                answer: "a".into(),
                explanation: None,
            }],
        };
        GenerationRecord::new(owner, title, None, payload).unwrap()
    }

    #[test]
    fn profile_crud() {
        let (store, _dir) = create_test_store();
        let user_id = profile_with_credits(&store, 5);

        let retrieved = store.get_profile(&user_id).unwrap().unwrap();
        assert_eq!(retrieved.credits, 5);

        store.delete_profile(&user_id).unwrap();
        assert!(store.get_profile(&user_id).unwrap().is_none());
    }

    #[test]
    fn debit_and_credit() {
        let (store, _dir) = create_test_store();
        let user_id = profile_with_credits(&store, 10);

        assert_eq!(store.try_debit(&user_id, 3).unwrap(), 7);
        assert_eq!(store.credit_balance(&user_id, 10).unwrap(), 17);

        let profile = store.get_profile(&user_id).unwrap().unwrap();
        assert_eq!(profile.credits, 17);
    }

    #[test]
    fn debit_below_balance_fails_without_writing() {
        let (store, _dir) = create_test_store();
        let user_id = profile_with_credits(&store, 2);

        let result = store.try_debit(&user_id, 3);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientCredits {
                balance: 2,
                required: 3
            })
        ));

        assert_eq!(store.get_profile(&user_id).unwrap().unwrap().credits, 2);
    }

    #[test]
    fn debit_missing_profile_is_not_found() {
        let (store, _dir) = create_test_store();
        let result = store.try_debit(&UserId::generate(), 1);
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn concurrent_debits_spend_each_credit_once() {
        let (store, _dir) = create_test_store();
        let store = std::sync::Arc::new(store);
        // Balance 5, two debits of 3: exactly one may win.
        let user_id = profile_with_credits(&store, 5);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || store.try_debit(&user_id, 3))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::InsufficientCredits { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);
        assert_eq!(store.get_profile(&user_id).unwrap().unwrap().credits, 2);
    }

    #[test]
    fn concurrent_credits_all_land() {
        let (store, _dir) = create_test_store();
        let store = std::sync::Arc::new(store);
        let user_id = profile_with_credits(&store, 0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || store.credit_balance(&user_id, 10).unwrap())
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_profile(&user_id).unwrap().unwrap().credits, 80);
    }

    #[test]
    fn payment_event_unique_per_session() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let event = PaymentEvent::new("cs_123", user_id, 10, PaymentSource::Webhook);
        store.insert_payment_event(&event).unwrap();

        let dup = PaymentEvent::new("cs_123", user_id, 10, PaymentSource::ClientReturn);
        let result = store.insert_payment_event(&dup);
        assert!(matches!(result, Err(StoreError::DuplicateEvent { .. })));

        // The first writer's record survives intact.
        let stored = store.get_payment_event("cs_123").unwrap().unwrap();
        assert_eq!(stored.source, PaymentSource::Webhook);
    }

    #[test]
    fn concurrent_payment_event_inserts_one_winner() {
        let (store, _dir) = create_test_store();
        let store = std::sync::Arc::new(store);
        let user_id = UserId::generate();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let event =
                        PaymentEvent::new("cs_race", user_id, 10, PaymentSource::Webhook);
                    store.insert_payment_event(&event)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(store.get_payment_event("cs_race").unwrap().is_some());
    }

    #[test]
    fn payment_event_rollback_delete() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let event = PaymentEvent::new("cs_rollback", user_id, 10, PaymentSource::Webhook);
        store.insert_payment_event(&event).unwrap();
        store.delete_payment_event("cs_rollback").unwrap();

        assert!(store.get_payment_event("cs_rollback").unwrap().is_none());
        // The slot is free again after the rollback.
        store.insert_payment_event(&event).unwrap();
    }

    #[test]
    fn generation_crud_and_listing() {
        let (store, _dir) = create_test_store();
        let owner = UserId::generate();

        let first = quiz_record(owner, "Chapter 1");
        store.put_generation(&first).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs

        let second = quiz_record(owner, "Chapter 2");
        store.put_generation(&second).unwrap();

        let retrieved = store.get_generation(&first.id).unwrap().unwrap();
        assert_eq!(retrieved.title, "Chapter 1");

        // Newest first
        let listed = store.list_generations_by_user(&owner, 10, 0).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Chapter 2");
        assert_eq!(listed[1].title, "Chapter 1");

        // Pagination
        let page1 = store.list_generations_by_user(&owner, 1, 0).unwrap();
        let page2 = store.list_generations_by_user(&owner, 1, 1).unwrap();
        assert_eq!(page1[0].title, "Chapter 2");
        assert_eq!(page2[0].title, "Chapter 1");

        // Other users see nothing
        let other = store
            .list_generations_by_user(&UserId::generate(), 10, 0)
            .unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn delete_generation_removes_index_entry() {
        let (store, _dir) = create_test_store();
        let owner = UserId::generate();

        let record = quiz_record(owner, "Doomed");
        store.put_generation(&record).unwrap();
        store.delete_generation(&record).unwrap();

        assert!(store.get_generation(&record.id).unwrap().is_none());
        assert!(store
            .list_generations_by_user(&owner, 10, 0)
            .unwrap()
            .is_empty());
    }
}
