//! Application state.

use std::sync::Arc;
use std::time::Duration;

use quizforge_store::{RocksStore, Store};

use crate::config::ServiceConfig;
use crate::genai::GenAiClient;
use crate::ledger::CreditLedger;
use crate::reconcile::PaymentReconciler;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// The credit ledger.
    pub ledger: CreditLedger,

    /// The payment reconciler.
    pub reconciler: PaymentReconciler,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// Generation backend client (optional).
    pub genai: Option<Arc<GenAiClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let dyn_store: Arc<dyn Store> = store.clone();
        let ledger = CreditLedger::new(dyn_store.clone());
        let reconciler = PaymentReconciler::new(dyn_store, ledger.clone());

        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(
                key,
                config.stripe_webhook_secret.clone(),
                config.stripe_api_url.clone(),
            ))
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - payments will not be available");
        }

        let genai = config.genai_api_key.as_ref().map(|key| {
            tracing::info!(base_url = %config.genai_api_url, "Generation backend enabled");
            Arc::new(GenAiClient::new(
                config.genai_api_url.clone(),
                key,
                config.genai_model.clone(),
                Duration::from_secs(config.genai_model_cache_ttl_seconds),
            ))
        });

        if genai.is_none() {
            tracing::warn!("Generation backend not configured - generation will not be available");
        }

        Self {
            store,
            config,
            ledger,
            reconciler,
            stripe,
            genai,
        }
    }
}
