//! Wire types for the generation backend API.

use serde::{Deserialize, Serialize};

use quizforge_core::{BlitzQuestion, KeyFact};

/// Request body for a content-generation call.
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    /// The conversation contents (a single user turn here).
    pub contents: Vec<RequestContent>,
}

impl GenerateContentRequest {
    /// Build a single-turn request from a prompt.
    #[must_use]
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.into(),
                }],
            }],
        }
    }
}

/// One content block in a request.
#[derive(Debug, Serialize)]
pub struct RequestContent {
    /// The block's parts.
    pub parts: Vec<RequestPart>,
}

/// One text part in a request.
#[derive(Debug, Serialize)]
pub struct RequestPart {
    /// The prompt text.
    pub text: String,
}

/// Response body from a content-generation call.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    /// Generated candidates (the first one is used).
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// The text of the first candidate, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
    }
}

/// One generated candidate.
#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    /// The candidate's content.
    #[serde(default)]
    pub content: CandidateContent,
}

/// Content of a generated candidate.
#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    /// The content's parts.
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One text part of a response.
#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    /// The generated text.
    #[serde(default)]
    pub text: String,
}

/// Response body from the model-listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ModelList {
    /// Available models.
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// One entry in the model listing.
#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    /// Fully qualified model name (`models/<name>`).
    pub name: String,

    /// Generation methods the model supports.
    #[serde(rename = "supportedGenerationMethods", default)]
    pub supported_generation_methods: Vec<String>,
}

/// The JSON shape the cram prompt asks the model to return.
#[derive(Debug, Deserialize)]
pub struct CramSheet {
    /// High-yield facts.
    pub summary: Vec<KeyFact>,

    /// Rapid-fire questions.
    pub blitz_questions: Vec<BlitzQuestion>,
}
