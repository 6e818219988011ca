//! Generation record and payload types.
//!
//! A generation is one paid AI output: either a quiz (multiple-choice
//! questions) or a cram pack (key facts plus rapid-fire questions). The
//! payload is a closed tagged enum validated at the storage boundary, not
//! an opaque blob inspected structurally at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GenerationId, UserId};

/// Number of answer options every quiz question must carry.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// Expected number of key facts in a cram summary.
pub const CRAM_SUMMARY_FACTS: usize = 10;

/// Expected number of blitz questions in a cram pack.
pub const CRAM_BLITZ_QUESTIONS: usize = 20;

/// Requested difficulty for quiz generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Basic recall with obvious correct answers.
    Easy,

    /// Comprehension with plausible distractors.
    #[default]
    Medium,

    /// Synthesis and analysis with subtle distractors.
    Hard,
}

impl Difficulty {
    /// Lowercase name, as used on the wire and in prompts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One multiple-choice quiz question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// The question text.
    pub question: String,

    /// Exactly [`QUIZ_OPTION_COUNT`] answer options.
    pub options: Vec<String>,

    /// The correct answer; must match one of `options` verbatim.
    pub answer: String,

    /// Optional explanation shown after answering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One high-yield fact in a cram summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFact {
    /// The concept being highlighted.
    pub topic: String,

    /// The information to remember.
    pub content: String,
}

/// One rapid-fire flashcard-style question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlitzQuestion {
    /// The question text.
    pub question: String,

    /// The answer to reveal.
    pub answer: String,
}

/// The generated content of one record, discriminated by a `kind` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationPayload {
    /// A multiple-choice quiz.
    Quiz {
        /// The generated questions.
        questions: Vec<QuizQuestion>,
    },

    /// A cram pack: summary facts plus blitz questions.
    Cram {
        /// High-yield facts for rapid review.
        summary: Vec<KeyFact>,

        /// Rapid-fire short-answer questions.
        blitz_questions: Vec<BlitzQuestion>,
    },
}

impl GenerationPayload {
    /// The payload's tag, as serialized.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Quiz { .. } => "quiz",
            Self::Cram { .. } => "cram",
        }
    }

    /// Validate the payload's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] if the payload is empty, a question does
    /// not carry exactly [`QUIZ_OPTION_COUNT`] options, or an answer does
    /// not match one of its options.
    pub fn validate(&self) -> Result<(), PayloadError> {
        match self {
            Self::Quiz { questions } => {
                if questions.is_empty() {
                    return Err(PayloadError::Empty);
                }
                for (index, q) in questions.iter().enumerate() {
                    if q.options.len() != QUIZ_OPTION_COUNT {
                        return Err(PayloadError::WrongOptionCount {
                            index,
                            count: q.options.len(),
                        });
                    }
                    if !q.options.contains(&q.answer) {
                        return Err(PayloadError::AnswerNotInOptions { index });
                    }
                }
                Ok(())
            }
            Self::Cram {
                summary,
                blitz_questions,
            } => {
                if summary.is_empty() || blitz_questions.is_empty() {
                    return Err(PayloadError::Empty);
                }
                Ok(())
            }
        }
    }
}

/// Structural violations found when validating a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload carries no content.
    #[error("payload has no content")]
    Empty,

    /// A quiz question has the wrong number of options.
    #[error("question {index} has {count} options, expected {QUIZ_OPTION_COUNT}")]
    WrongOptionCount {
        /// Zero-based question index.
        index: usize,
        /// The number of options found.
        count: usize,
    },

    /// A quiz question's answer matches none of its options.
    #[error("question {index}: answer is not one of the options")]
    AnswerNotInOptions {
        /// Zero-based question index.
        index: usize,
    },
}

/// One stored generation: a paid, immutable AI output owned by one user.
///
/// Created only after a successful debit. There is no update path; the
/// record is deleted only as a compensating action when a step after
/// creation fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Unique record id (ULID, time-ordered).
    pub id: GenerationId,

    /// The user who paid for and owns this record.
    pub owner: UserId,

    /// User-supplied title.
    pub title: String,

    /// Name of the uploaded source document, if any.
    pub source_filename: Option<String>,

    /// The generated content.
    pub payload: GenerationPayload,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    /// Create a record from a validated payload.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] if the payload fails validation; invalid
    /// payloads never reach storage.
    pub fn new(
        owner: UserId,
        title: impl Into<String>,
        source_filename: Option<String>,
        payload: GenerationPayload,
    ) -> Result<Self, PayloadError> {
        payload.validate()?;
        Ok(Self {
            id: GenerationId::generate(),
            owner,
            title: title.into(),
            source_filename,
            payload,
            created_at: Utc::now(),
        })
    }
}
