//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but the resource belongs to someone else.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Insufficient credits for the requested generation.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The checkout session has not been paid yet.
    #[error("payment not completed")]
    PaymentNotCompleted,

    /// The generation backend failed; any debit was refunded.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::InsufficientCredits { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::PaymentNotCompleted => (
                StatusCode::CONFLICT,
                "payment_not_completed",
                self.to_string(),
                None,
            ),
            Self::GenerationFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                "generation_failed",
                msg.clone(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<quizforge_store::StoreError> for ApiError {
    fn from(err: quizforge_store::StoreError) -> Self {
        match err {
            quizforge_store::StoreError::NotFound => Self::NotFound("record not found".into()),
            quizforge_store::StoreError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            quizforge_store::StoreError::DuplicateEvent { session_id } => {
                Self::Internal(format!("unexpected duplicate event: {session_id}"))
            }
            quizforge_store::StoreError::Database(msg)
            | quizforge_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<crate::ledger::LedgerError> for ApiError {
    fn from(err: crate::ledger::LedgerError) -> Self {
        match err {
            crate::ledger::LedgerError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            crate::ledger::LedgerError::ProfileNotFound { user_id } => {
                Self::NotFound(format!("profile not found: {user_id}"))
            }
            crate::ledger::LedgerError::Storage(msg) => Self::Internal(msg),
        }
    }
}

impl From<crate::reconcile::ReconcileError> for ApiError {
    fn from(err: crate::reconcile::ReconcileError) -> Self {
        match err {
            crate::reconcile::ReconcileError::ProfileNotFound { user_id } => {
                Self::NotFound(format!("profile not found: {user_id}"))
            }
            crate::reconcile::ReconcileError::CreditFailed(msg)
            | crate::reconcile::ReconcileError::Storage(msg) => Self::Internal(msg),
        }
    }
}

impl From<crate::generate::GenerateError> for ApiError {
    fn from(err: crate::generate::GenerateError) -> Self {
        match err {
            crate::generate::GenerateError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            crate::generate::GenerateError::ProfileNotFound { user_id } => {
                Self::NotFound(format!("profile not found: {user_id}"))
            }
            crate::generate::GenerateError::Generation(msg) => Self::GenerationFailed(msg),
            crate::generate::GenerateError::Storage(msg) => Self::Internal(msg),
        }
    }
}
