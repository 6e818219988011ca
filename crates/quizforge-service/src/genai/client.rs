//! Generation backend client implementation.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::Client;

use quizforge_core::{
    Difficulty, GenerationPayload, QuizQuestion, CRAM_BLITZ_QUESTIONS, CRAM_SUMMARY_FACTS,
};

use super::types::{CramSheet, GenerateContentRequest, GenerateContentResponse, ModelInfo, ModelList};

/// Models preferred during discovery, in order.
const PREFERRED_MODELS: &[&str] = &["gemini-2.5-flash-lite", "gemini-2.0-flash-lite"];

/// The generation method a usable model must support.
const GENERATE_METHOD: &str = "generateContent";

/// Documents are truncated to this many characters before prompting.
const DOCUMENT_CHAR_LIMIT: usize = 15_000;

/// Error type for generation backend operations.
#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("generation API error: HTTP {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or message.
        message: String,
    },

    /// The API returned no candidates.
    #[error("generation API returned no content")]
    EmptyResponse,

    /// The model's output was not the JSON shape the prompt asked for.
    #[error("failed to parse model output: {0}")]
    Parse(String),
}

/// A cached, resolved model name with an expiry.
#[derive(Debug, Clone)]
struct CachedModel {
    name: String,
    resolved_at: Instant,
}

/// Process-wide cache for the resolved model name.
///
/// Discovery hits the model-listing endpoint; the winner is reused until
/// the TTL elapses or the cache is invalidated after an API failure. The
/// cache is injected into the client rather than hidden in module state so
/// its lifetime and invalidation are explicit.
#[derive(Debug)]
pub struct ModelCache {
    ttl: Duration,
    slot: Mutex<Option<CachedModel>>,
}

impl ModelCache {
    /// Create a cache with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached name, if still fresh.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        let slot = self.slot.lock().expect("model cache poisoned");
        slot.as_ref()
            .filter(|cached| cached.resolved_at.elapsed() < self.ttl)
            .map(|cached| cached.name.clone())
    }

    /// Store a freshly resolved name.
    pub fn store(&self, name: impl Into<String>) {
        let mut slot = self.slot.lock().expect("model cache poisoned");
        *slot = Some(CachedModel {
            name: name.into(),
            resolved_at: Instant::now(),
        });
    }

    /// Drop the cached name so the next call re-resolves.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().expect("model cache poisoned");
        *slot = None;
    }
}

/// Client for the generation backend.
#[derive(Debug)]
pub struct GenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    fallback_model: String,
    model_cache: ModelCache,
}

impl GenAiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base URL (overridden in tests)
    /// * `api_key` - API key, passed as a query parameter
    /// * `fallback_model` - model used when discovery fails
    /// * `model_cache_ttl` - how long a discovered model name is reused
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        fallback_model: impl Into<String>,
        model_cache_ttl: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            fallback_model: fallback_model.into(),
            model_cache: ModelCache::new(model_cache_ttl),
        }
    }

    /// Generate quiz questions from a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the output is not a JSON
    /// array of questions.
    pub async fn generate_quiz(
        &self,
        document_text: &str,
        question_count: usize,
        difficulty: Difficulty,
    ) -> Result<Vec<QuizQuestion>, GenAiError> {
        let prompt = quiz_prompt(document_text, question_count, difficulty);
        let text = self.generate_text(&prompt).await?;

        let questions: Vec<QuizQuestion> =
            serde_json::from_str(&text).map_err(|e| GenAiError::Parse(e.to_string()))?;

        Ok(questions)
    }

    /// Generate a cram pack from a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the output is not the
    /// expected JSON object.
    pub async fn generate_cram(&self, document_text: &str) -> Result<GenerationPayload, GenAiError> {
        let prompt = cram_prompt(document_text);
        let text = self.generate_text(&prompt).await?;

        let sheet: CramSheet =
            serde_json::from_str(&text).map_err(|e| GenAiError::Parse(e.to_string()))?;

        if sheet.summary.len() != CRAM_SUMMARY_FACTS {
            tracing::warn!(
                expected = CRAM_SUMMARY_FACTS,
                got = sheet.summary.len(),
                "cram summary came back with an unexpected fact count"
            );
        }
        if sheet.blitz_questions.len() != CRAM_BLITZ_QUESTIONS {
            tracing::warn!(
                expected = CRAM_BLITZ_QUESTIONS,
                got = sheet.blitz_questions.len(),
                "cram pack came back with an unexpected question count"
            );
        }

        Ok(GenerationPayload::Cram {
            summary: sheet.summary,
            blitz_questions: sheet.blitz_questions,
        })
    }

    /// Run one generation call and return the raw text output.
    async fn generate_text(&self, prompt: &str) -> Result<String, GenAiError> {
        let model = self.resolve_model().await;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // A failing model may have been deprecated; re-resolve next time.
            self.model_cache.invalidate();
            let message = response.text().await.unwrap_or_default();
            return Err(GenAiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.first_text().ok_or(GenAiError::EmptyResponse)?;

        Ok(strip_code_fences(text.trim()).to_string())
    }

    /// Resolve the model to call, consulting the cache first.
    async fn resolve_model(&self) -> String {
        if let Some(name) = self.model_cache.get() {
            return name;
        }

        match self.list_models().await {
            Ok(list) => {
                if let Some(name) = pick_model(&list) {
                    self.model_cache.store(&name);
                    return name;
                }
                tracing::warn!(
                    fallback = %self.fallback_model,
                    "no listed model supports generation, using fallback"
                );
                self.fallback_model.clone()
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = %self.fallback_model,
                    "model discovery failed, using fallback"
                );
                self.fallback_model.clone()
            }
        }
    }

    /// Fetch the model listing.
    async fn list_models(&self) -> Result<ModelList, GenAiError> {
        let response = self
            .client
            .get(format!("{}/v1beta/models", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenAiError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Pick the best usable model from a listing: first preference that
/// supports generation, otherwise any model that does.
fn pick_model(list: &ModelList) -> Option<String> {
    let supports = |info: &&ModelInfo| {
        info.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_METHOD)
    };

    for preferred in PREFERRED_MODELS {
        if let Some(model) = list
            .models
            .iter()
            .filter(supports)
            .find(|m| m.name.contains(preferred))
        {
            return Some(short_model_name(&model.name));
        }
    }

    list.models
        .iter()
        .find(supports)
        .map(|m| short_model_name(&m.name))
}

/// Strip the `models/` prefix from a listed model name.
fn short_model_name(name: &str) -> String {
    name.strip_prefix("models/").unwrap_or(name).to_string()
}

/// Remove a wrapping markdown code fence, if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Truncate a document to the prompt budget on a char boundary.
fn document_excerpt(document_text: &str) -> &str {
    document_text
        .char_indices()
        .nth(DOCUMENT_CHAR_LIMIT)
        .map_or(document_text, |(i, _)| &document_text[..i])
}

/// Build the quiz-generation prompt.
fn quiz_prompt(document_text: &str, question_count: usize, difficulty: Difficulty) -> String {
    let difficulty_instructions = match difficulty {
        Difficulty::Easy => {
            "Create straightforward questions that test basic recall. Use clear language and obvious correct answers."
        }
        Difficulty::Medium => {
            "Create questions that require comprehension and some analysis. Include plausible distractors."
        }
        Difficulty::Hard => {
            "Create challenging questions that require critical thinking and synthesis. Use subtle distractors."
        }
    };

    format!(
        "You are an expert instructional designer. Generate a JSON array of quiz questions \
         based on the provided document.\n\n\
         Requirements:\n\
         - Return ONLY a valid JSON array, no markdown, no code blocks, no explanations\n\
         - Each question must have: \"question\" (string), \"options\" (array of exactly 4 \
         strings), \"answer\" (string matching one of the options), \"explanation\" (string, \
         optional)\n\
         - Generate exactly {question_count} questions based on the document content\n\
         - Base questions strictly on the provided document text\n\
         - Difficulty level: {difficulty}. {difficulty_instructions}\n\n\
         Document:\n{document}",
        document = document_excerpt(document_text),
    )
}

/// Build the cram-pack prompt.
fn cram_prompt(document_text: &str) -> String {
    format!(
        "You are an exam tutor helping a student who has an exam tomorrow. Analyze the \
         provided document and extract the most critical information for rapid review.\n\n\
         Your task:\n\
         1. Identify the top {facts} highest-yield facts, definitions, or formulas\n\
         2. Generate {questions} rapid-fire short-answer questions based strictly on those \
         facts\n\n\
         Requirements:\n\
         - Return ONLY a valid JSON object with this exact structure:\n\
         {{\"summary\": [{{\"topic\": \"string\", \"content\": \"string\"}}, ...], \
         \"blitz_questions\": [{{\"question\": \"string\", \"answer\": \"string\"}}, ...]}}\n\
         - NO markdown, NO code blocks, NO explanations - ONLY the JSON object\n\
         - Ignore filler content - focus on exam-critical information\n\
         - Questions should be short and direct, answers concise\n\n\
         Document:\n{document}",
        facts = CRAM_SUMMARY_FACTS,
        questions = CRAM_BLITZ_QUESTIONS,
        document = document_excerpt(document_text),
    )
}
