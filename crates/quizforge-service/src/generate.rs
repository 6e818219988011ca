//! The generation orchestrator.
//!
//! One generation request moves through `Pending → Debited → Generated →
//! Saved`. Any failure after the debit triggers a compensating refund so
//! the user never pays for a result they did not receive; the debit-first
//! ordering means they also never receive a result they did not pay for.
//! Compensation is best-effort: a refund that itself fails is flagged for
//! manual reconciliation, never swallowed.

use std::future::Future;

use quizforge_core::{GenerationPayload, GenerationRecord, UserId};
use quizforge_store::Store;

use crate::genai::GenAiError;
use crate::ledger::{CreditLedger, LedgerError};

/// Parameters common to every generation request.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    /// Title for the stored record.
    pub title: String,

    /// Name of the uploaded source document, if any.
    pub source_filename: Option<String>,

    /// Credits to debit before generating.
    pub cost: i64,
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The balance does not cover the generation cost.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// No profile exists for the user.
    #[error("profile not found: {user_id}")]
    ProfileNotFound {
        /// The user whose profile is missing.
        user_id: UserId,
    },

    /// The generation backend failed or produced an invalid payload.
    /// The debit has been refunded (or flagged if the refund failed).
    #[error("generation failed: {0}")]
    Generation(String),

    /// Persisting the record failed. The debit has been refunded.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Run one paid generation: debit, produce, validate, persist.
///
/// `produce` is the opaque, possibly-failing call to the AI collaborator.
/// No retries happen here; a failure refunds the debit and surfaces as
/// [`GenerateError::Generation`].
///
/// # Errors
///
/// See [`GenerateError`]. `InsufficientCredits` means nothing was debited;
/// every other error leaves the balance as it was before the call (modulo
/// a flagged refund failure).
pub async fn run_generation<F, Fut>(
    ledger: &CreditLedger,
    store: &dyn Store,
    user_id: UserId,
    input: NewGeneration,
    produce: F,
) -> Result<GenerationRecord, GenerateError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<GenerationPayload, GenAiError>>,
{
    match ledger.try_debit(user_id, input.cost) {
        Ok(_) => {}
        Err(LedgerError::InsufficientCredits { balance, required }) => {
            return Err(GenerateError::InsufficientCredits { balance, required });
        }
        Err(LedgerError::ProfileNotFound { user_id }) => {
            return Err(GenerateError::ProfileNotFound { user_id });
        }
        Err(LedgerError::Storage(msg)) => return Err(GenerateError::Storage(msg)),
    }

    let payload = match produce().await {
        Ok(payload) => payload,
        Err(e) => {
            refund_after_failure(ledger, user_id, input.cost, "generate");
            return Err(GenerateError::Generation(e.to_string()));
        }
    };

    let record = match GenerationRecord::new(user_id, input.title, input.source_filename, payload)
    {
        Ok(record) => record,
        Err(e) => {
            refund_after_failure(ledger, user_id, input.cost, "validate");
            return Err(GenerateError::Generation(e.to_string()));
        }
    };

    // put_generation writes record and index in one batch, so a failure
    // here leaves no partial row to clean up.
    if let Err(e) = store.put_generation(&record) {
        refund_after_failure(ledger, user_id, input.cost, "persist");
        return Err(GenerateError::Storage(e.to_string()));
    }

    tracing::info!(
        user_id = %user_id,
        generation_id = %record.id,
        kind = record.payload.kind(),
        cost = input.cost,
        "generation saved"
    );

    Ok(record)
}

/// Best-effort refund after a failed step; a refund failure is a
/// reconciliation discrepancy and must be flagged with enough detail to
/// repair by hand.
fn refund_after_failure(ledger: &CreditLedger, user_id: UserId, amount: i64, step: &str) {
    if let Err(e) = ledger.refund(user_id, amount) {
        tracing::error!(
            user_id = %user_id,
            amount,
            step,
            error = %e,
            "reconciliation discrepancy: refund failed after generation failure"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_core::{Profile, QuizQuestion, QUIZ_COST_CREDITS};
    use quizforge_store::RocksStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup(credits: i64) -> (CreditLedger, Arc<RocksStore>, UserId, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let user_id = UserId::generate();
        store.put_profile(&Profile::new(user_id, credits)).unwrap();
        let ledger = CreditLedger::new(store.clone() as Arc<dyn Store>);
        (ledger, store, user_id, dir)
    }

    fn quiz_payload() -> GenerationPayload {
        GenerationPayload::Quiz {
            questions: vec![QuizQuestion {
                question: "q".into(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                answer: "a".into(),
                explanation: None,
            }],
        }
    }

    fn input(cost: i64) -> NewGeneration {
        NewGeneration {
            title: "Biology".into(),
            source_filename: Some("notes.pdf".into()),
            cost,
        }
    }

    #[tokio::test]
    async fn success_debits_and_persists() {
        let (ledger, store, user_id, _dir) = setup(3);

        let record = run_generation(&ledger, store.as_ref(), user_id, input(1), || async {
            Ok(quiz_payload())
        })
        .await
        .unwrap();

        assert_eq!(store.get_profile(&user_id).unwrap().unwrap().credits, 2);
        assert!(store.get_generation(&record.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn backend_failure_refunds_exactly() {
        // User has 1 credit, generation costs 1, the backend fails:
        // balance must come back to 1 and the error must be a generation
        // failure, not insufficient credits.
        let (ledger, store, user_id, _dir) = setup(1);

        let result = run_generation(
            &ledger,
            store.as_ref(),
            user_id,
            input(QUIZ_COST_CREDITS),
            || async {
                Err(GenAiError::Api {
                    status: 500,
                    message: "model overloaded".into(),
                })
            },
        )
        .await;

        assert!(matches!(result, Err(GenerateError::Generation(_))));
        assert_eq!(store.get_profile(&user_id).unwrap().unwrap().credits, 1);
        assert!(store
            .list_generations_by_user(&user_id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn invalid_payload_refunds() {
        let (ledger, store, user_id, _dir) = setup(3);

        let result = run_generation(&ledger, store.as_ref(), user_id, input(3), || async {
            Ok(GenerationPayload::Quiz { questions: vec![] })
        })
        .await;

        assert!(matches!(result, Err(GenerateError::Generation(_))));
        assert_eq!(store.get_profile(&user_id).unwrap().unwrap().credits, 3);
    }

    #[tokio::test]
    async fn insufficient_credits_debits_nothing() {
        let (ledger, store, user_id, _dir) = setup(2);

        let result = run_generation(&ledger, store.as_ref(), user_id, input(3), || async {
            Ok(quiz_payload())
        })
        .await;

        assert!(matches!(
            result,
            Err(GenerateError::InsufficientCredits {
                balance: 2,
                required: 3
            })
        ));
        assert_eq!(store.get_profile(&user_id).unwrap().unwrap().credits, 2);
    }

    #[tokio::test]
    async fn missing_profile_never_calls_backend() {
        let (ledger, store, _user_id, _dir) = setup(0);

        let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = called.clone();

        let result = run_generation(
            &ledger,
            store.as_ref(),
            UserId::generate(),
            input(1),
            || async move {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(quiz_payload())
            },
        )
        .await;

        assert!(matches!(result, Err(GenerateError::ProfileNotFound { .. })));
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }
}
