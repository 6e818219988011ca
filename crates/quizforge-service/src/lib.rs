//! QuizForge HTTP API service.
//!
//! This crate provides the HTTP API for QuizForge, including:
//!
//! - Profile management and credit balances
//! - Quiz and cram-pack generation (credit-metered)
//! - Checkout and payment confirmation
//! - Payment-processor webhooks
//!
//! # Core subsystems
//!
//! The credit system is built from three pieces layered on the store:
//!
//! 1. [`CreditLedger`] - race-safe debit/credit/refund primitives.
//! 2. [`PaymentReconciler`] - grants credits exactly once per completed
//!    checkout session, across duplicated and racing delivery channels.
//! 3. [`generate::run_generation`] - the debit, generate, persist
//!    sequence with compensating refunds on failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod genai;
pub mod generate;
pub mod handlers;
pub mod ledger;
pub mod reconcile;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use genai::{GenAiClient, GenAiError};
pub use ledger::{CreditLedger, LedgerError};
pub use reconcile::{PaymentReconciler, ReconcileError, ReconcileOutcome};
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
