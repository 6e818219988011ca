//! Generation handlers: quiz, cram, listing, and retrieval.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use quizforge_core::{
    Difficulty, GenerationId, GenerationPayload, GenerationRecord, CRAM_COST_CREDITS,
    QUIZ_COST_CREDITS,
};
use quizforge_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::genai::GenAiClient;
use crate::generate::{run_generation, NewGeneration};
use crate::state::AppState;

/// Default number of quiz questions.
const DEFAULT_QUESTION_COUNT: u8 = 10;

/// Upper bound on requested quiz questions.
const MAX_QUESTION_COUNT: u8 = 30;

/// Quiz generation request.
#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    /// Extracted text of the source document.
    pub document_text: String,
    /// Title for the stored quiz.
    #[serde(default)]
    pub title: Option<String>,
    /// Name of the uploaded file, if any.
    #[serde(default)]
    pub source_filename: Option<String>,
    /// Number of questions (default 10, max 30).
    #[serde(default)]
    pub question_count: Option<u8>,
    /// Requested difficulty (default medium).
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Cram generation request.
#[derive(Debug, Deserialize)]
pub struct GenerateCramRequest {
    /// Extracted text of the source document.
    pub document_text: String,
    /// Title for the stored cram pack.
    #[serde(default)]
    pub title: Option<String>,
    /// Name of the uploaded file, if any.
    #[serde(default)]
    pub source_filename: Option<String>,
}

/// Full generation response, payload included.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    /// Record id.
    pub id: String,
    /// Record title.
    pub title: String,
    /// Source document name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    /// The generated content (tagged by `kind`).
    pub payload: GenerationPayload,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&GenerationRecord> for GenerationResponse {
    fn from(record: &GenerationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            source_filename: record.source_filename.clone(),
            payload: record.payload.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Listing entry without the payload.
#[derive(Debug, Serialize)]
pub struct GenerationSummary {
    /// Record id.
    pub id: String,
    /// Record title.
    pub title: String,
    /// Source document name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    /// Payload kind ("quiz" or "cram").
    pub kind: &'static str,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&GenerationRecord> for GenerationSummary {
    fn from(record: &GenerationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            source_filename: record.source_filename.clone(),
            kind: record.payload.kind(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Generation list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListGenerationsQuery {
    /// Maximum number of records to return (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// List generations response.
#[derive(Debug, Serialize)]
pub struct ListGenerationsResponse {
    /// Records, newest first.
    pub generations: Vec<GenerationSummary>,
    /// Whether more records exist past this page.
    pub has_more: bool,
}

/// Generate a quiz from document text. Costs one credit; the debit is
/// refunded if generation fails.
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<GenerateQuizRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let document = required_document(&body.document_text)?;
    let genai = configured_backend(&state)?;

    let question_count = usize::from(
        body.question_count
            .unwrap_or(DEFAULT_QUESTION_COUNT)
            .clamp(1, MAX_QUESTION_COUNT),
    );
    let difficulty = body.difficulty.unwrap_or_default();

    let input = NewGeneration {
        title: title_or(body.title, "Untitled Quiz"),
        source_filename: body.source_filename,
        cost: QUIZ_COST_CREDITS,
    };

    let record = run_generation(
        &state.ledger,
        state.store.as_ref(),
        auth.user_id,
        input,
        || async move {
            let questions = genai
                .generate_quiz(&document, question_count, difficulty)
                .await?;
            Ok(GenerationPayload::Quiz { questions })
        },
    )
    .await?;

    Ok(Json(GenerationResponse::from(&record)))
}

/// Generate a cram pack from document text. Costs three credits; the
/// debit is refunded if generation fails.
pub async fn generate_cram(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<GenerateCramRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let document = required_document(&body.document_text)?;
    let genai = configured_backend(&state)?;

    let input = NewGeneration {
        title: title_or(body.title, "Cram Session"),
        source_filename: body.source_filename,
        cost: CRAM_COST_CREDITS,
    };

    let record = run_generation(
        &state.ledger,
        state.store.as_ref(),
        auth.user_id,
        input,
        || async move { genai.generate_cram(&document).await },
    )
    .await?;

    Ok(Json(GenerationResponse::from(&record)))
}

/// List the caller's generations, newest first.
pub async fn list_generations(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListGenerationsQuery>,
) -> Result<Json<ListGenerationsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let records = state
        .store
        .list_generations_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = records.len() > limit;
    let generations: Vec<_> = records
        .iter()
        .take(limit)
        .map(GenerationSummary::from)
        .collect();

    Ok(Json(ListGenerationsResponse {
        generations,
        has_more,
    }))
}

/// Fetch one generation. Ownership is exclusive: another user's record is
/// indistinguishable from a missing one.
pub async fn get_generation(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let generation_id: GenerationId = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid generation id".into()))?;

    let record = state
        .store
        .get_generation(&generation_id)?
        .filter(|record| record.owner == auth.user_id)
        .ok_or_else(|| ApiError::NotFound("Generation not found".into()))?;

    Ok(Json(GenerationResponse::from(&record)))
}

/// Reject empty documents before debiting anything.
fn required_document(document_text: &str) -> Result<String, ApiError> {
    let trimmed = document_text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("document_text is required".into()));
    }
    Ok(trimmed.to_string())
}

/// The generation backend, or a structured error when not configured.
fn configured_backend(state: &AppState) -> Result<Arc<GenAiClient>, ApiError> {
    state
        .genai
        .clone()
        .ok_or_else(|| ApiError::ExternalService("Generation backend not configured".into()))
}

/// Use the provided title unless it is blank.
fn title_or(title: Option<String>, fallback: &str) -> String {
    title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
