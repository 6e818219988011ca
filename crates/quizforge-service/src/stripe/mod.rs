//! Stripe integration: checkout sessions and webhook verification.

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeError};
pub use types::{CheckoutSession, METADATA_USER_ID};
