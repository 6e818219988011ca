//! Request and response types for the QuizForge API.

use serde::{Deserialize, Serialize};

use quizforge_core::{Difficulty, GenerationPayload};

/// A user's profile and balance.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    /// The user id.
    pub user_id: String,
    /// Current credit balance.
    pub credits: i64,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// Quiz generation request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateQuizRequest {
    /// Extracted text of the source document.
    pub document_text: String,
    /// Title for the stored quiz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the uploaded file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    /// Number of questions (service default when omitted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_count: Option<u8>,
    /// Requested difficulty (service default when omitted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// Cram generation request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateCramRequest {
    /// Extracted text of the source document.
    pub document_text: String,
    /// Title for the stored cram pack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the uploaded file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
}

/// One stored generation, payload included.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    /// Record id.
    pub id: String,
    /// Record title.
    pub title: String,
    /// Source document name, if any.
    #[serde(default)]
    pub source_filename: Option<String>,
    /// The generated content (tagged by `kind`).
    pub payload: GenerationPayload,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// One listing entry, without the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSummary {
    /// Record id.
    pub id: String,
    /// Record title.
    pub title: String,
    /// Source document name, if any.
    #[serde(default)]
    pub source_filename: Option<String>,
    /// Payload kind ("quiz" or "cram").
    pub kind: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// A page of generation listings.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationListResponse {
    /// Records, newest first.
    pub generations: Vec<GenerationSummary>,
    /// Whether more records exist past this page.
    pub has_more: bool,
}

/// A newly created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    /// Hosted checkout URL to redirect the user to.
    pub checkout_url: String,
    /// Session ID for tracking.
    pub session_id: String,
}

/// Result of confirming a payment on return from checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentResponse {
    /// Whether this call performed the credit.
    pub credited: bool,
    /// Whether the payment had already been credited (also a success).
    pub already_processed: bool,
    /// The balance after reconciliation.
    pub balance: i64,
}
