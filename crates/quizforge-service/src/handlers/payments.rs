//! Payment handlers: checkout creation and the client-return channel.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use quizforge_core::{PaymentSource, CREDITS_PER_PURCHASE};
use quizforge_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::StripeClient;

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Hosted checkout URL to redirect the user to.
    pub checkout_url: String,
    /// Session ID for tracking.
    pub session_id: String,
}

/// Create a checkout session for the credit pack.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let stripe = configured_stripe(&state)?;

    // A payment for a user we have never seen could never be reconciled;
    // require the profile up front.
    state
        .store
        .get_profile(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    let success_url = format!(
        "{}/dashboard?success=1&session_id={{CHECKOUT_SESSION_ID}}",
        state.config.frontend_url
    );
    let cancel_url = format!("{}/dashboard?canceled=1", state.config.frontend_url);

    let session = stripe
        .create_checkout_session(&auth.user_id, &success_url, &cancel_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create checkout session");
            ApiError::ExternalService(format!("Failed to create checkout session: {e}"))
        })?;

    let checkout_url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("Checkout session has no redirect URL".into()))?;

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        checkout_url,
        session_id: session.id,
    }))
}

/// Payment confirmation request (client-return channel).
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    /// The checkout session id from the success redirect.
    pub session_id: String,
}

/// Payment confirmation response.
#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    /// Whether this call performed the credit.
    pub credited: bool,
    /// Whether the payment had already been credited (also a success).
    pub already_processed: bool,
    /// The balance after reconciliation.
    pub balance: i64,
}

/// Confirm a payment after the user returns from checkout.
///
/// Best-effort twin of the webhook channel: the webhook may have processed
/// this session already, may land at the same instant, or may still be on
/// its way. Whatever the interleaving, the reconciler grants the credits
/// at most once.
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, ApiError> {
    let stripe = configured_stripe(&state)?;

    // This channel has no processor signature; authenticate the event by
    // looking the session up at the processor directly.
    let session = stripe
        .get_checkout_session(&body.session_id)
        .await
        .map_err(|e| {
            tracing::warn!(session_id = %body.session_id, error = %e, "Session lookup failed");
            ApiError::ExternalService(format!("Failed to look up checkout session: {e}"))
        })?;

    if !session.is_paid() {
        return Err(ApiError::PaymentNotCompleted);
    }

    // The session must belong to the caller; a signed-in user must not be
    // able to claim someone else's checkout.
    let owner = session
        .metadata_user_id()
        .ok_or_else(|| ApiError::BadRequest("Session has no user metadata".into()))?;
    if owner != auth.user_id.to_string() {
        tracing::warn!(
            user_id = %auth.user_id,
            session_id = %session.id,
            "Session ownership mismatch on payment confirmation"
        );
        return Err(ApiError::Forbidden(
            "Checkout session does not belong to the current user".into(),
        ));
    }

    let outcome = state.reconciler.reconcile(
        &session.id,
        auth.user_id,
        CREDITS_PER_PURCHASE,
        PaymentSource::ClientReturn,
    )?;

    let profile = state
        .store
        .get_profile(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(ConfirmPaymentResponse {
        credited: outcome.credited,
        already_processed: outcome.already_processed,
        balance: profile.credits,
    }))
}

/// The Stripe client, or a structured error when payments are disabled.
fn configured_stripe(state: &AppState) -> Result<Arc<StripeClient>, ApiError> {
    state
        .stripe
        .clone()
        .ok_or_else(|| ApiError::ExternalService("Payments not configured".into()))
}
