//! Core types for the QuizForge backend.
//!
//! This crate provides the foundational types used throughout QuizForge:
//!
//! - **Identifiers**: `UserId`, `GenerationId`
//! - **Profiles**: `Profile` (the per-user credit balance)
//! - **Payments**: `PaymentEvent`, `PaymentSource`
//! - **Generations**: `GenerationRecord`, `GenerationPayload`, question types
//! - **Pricing**: credit costs and the credit-pack product
//!
//! # Credits
//!
//! A credit is the unit of consumption metering: one quiz generation costs
//! 1 credit, one cram pack costs 3. Balances are stored as `i64` and are
//! never observed below zero; all mutation goes through the store's atomic
//! primitives.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod generation;
pub mod ids;
pub mod payment;
pub mod pricing;
pub mod profile;

pub use generation::{
    BlitzQuestion, Difficulty, GenerationPayload, GenerationRecord, KeyFact, PayloadError,
    QuizQuestion, CRAM_BLITZ_QUESTIONS, CRAM_SUMMARY_FACTS, QUIZ_OPTION_COUNT,
};
pub use ids::{GenerationId, IdError, UserId};
pub use payment::{PaymentEvent, PaymentSource};
pub use pricing::{
    CRAM_COST_CREDITS, CREDIT_PACK_PRICE_CENTS, CREDIT_PACK_PRODUCT_NAME, CREDITS_PER_PURCHASE,
    QUIZ_COST_CREDITS,
};
pub use profile::Profile;
