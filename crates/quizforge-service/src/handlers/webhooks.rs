//! Payment processor webhook handler.
//!
//! The durable notification channel. The processor retries delivery until
//! it gets a 2xx, so verified events are always acknowledged - including
//! ones the reconciler has already seen - and any non-2xx is an invitation
//! to redeliver.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use quizforge_core::{PaymentSource, UserId, CREDITS_PER_PURCHASE};

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::types::METADATA_USER_ID;

/// Stripe webhook envelope (the subset this service reads).
#[derive(Debug, Deserialize)]
pub struct StripeWebhook {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event ID.
    pub id: String,
    /// Event data.
    pub data: StripeEventData,
}

/// Stripe event data container.
#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    /// Event object.
    pub object: serde_json::Value,
}

/// The checkout session embedded in a completed-checkout event.
#[derive(Debug, Deserialize)]
struct WebhookSession {
    id: String,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was received.
    pub received: bool,
}

/// Handle payment processor webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Payments not configured".into()))?;

    // The signature is this channel's authentication; nothing in the body
    // is trusted before it checks out.
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

    stripe
        .verify_webhook_signature(&body, signature)
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected webhook with invalid signature");
            ApiError::BadRequest("Invalid webhook signature".into())
        })?;

    let webhook: StripeWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.id,
        "Received payment webhook"
    );

    if webhook.event_type != "checkout.session.completed" {
        tracing::debug!(event_type = %webhook.event_type, "Ignoring webhook event type");
        return Ok(Json(WebhookResponse { received: true }));
    }

    let session: WebhookSession = serde_json::from_value(webhook.data.object)
        .map_err(|e| ApiError::BadRequest(format!("Malformed session object: {e}")))?;

    if session.payment_status.as_deref() != Some("paid") {
        tracing::info!(
            session_id = %session.id,
            payment_status = ?session.payment_status,
            "Checkout session not paid yet, skipping"
        );
        return Ok(Json(WebhookResponse { received: true }));
    }

    let user_id: UserId = session
        .metadata
        .get(METADATA_USER_ID)
        .ok_or_else(|| ApiError::BadRequest("Missing userId in session metadata".into()))?
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid userId in session metadata".into()))?;

    let outcome = state.reconciler.reconcile(
        &session.id,
        user_id,
        CREDITS_PER_PURCHASE,
        PaymentSource::Webhook,
    )?;

    tracing::info!(
        session_id = %session.id,
        user_id = %user_id,
        credited = outcome.credited,
        already_processed = outcome.already_processed,
        "Webhook reconciled"
    );

    // Acknowledge duplicates too; a non-2xx would just make the processor
    // redeliver an event we have already recorded.
    Ok(Json(WebhookResponse { received: true }))
}
