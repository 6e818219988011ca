//! Authentication extractor.
//!
//! End users authenticate with HS256 bearer tokens issued by the external
//! auth provider; the `sub` claim carries the user id. The webhook route
//! does not use this extractor - its authentication is the payload
//! signature.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use quizforge_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims this service validates.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,

    /// Audience; must match the configured value.
    pub aud: String,

    /// Expiry (seconds since the epoch).
    pub exp: i64,
}

/// An authenticated user extracted from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID from the token's `sub` claim.
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[state.config.auth_audience.as_str()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.auth_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::Unauthorized
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser { user_id })
    }
}
