//! Profile handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use quizforge_core::Profile;
use quizforge_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// The user id.
    pub user_id: String,
    /// Current credit balance.
    pub credits: i64,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            credits: profile.credits,
            created_at: profile.created_at.to_rfc3339(),
        }
    }
}

/// Create the caller's profile with the signup grant.
///
/// Idempotent: if the profile already exists it is returned unchanged, so
/// a repeated signup call can never reset a spent balance.
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    if let Some(existing) = state.store.get_profile(&auth.user_id)? {
        return Ok(Json(ProfileResponse::from(&existing)));
    }

    let profile = Profile::new(auth.user_id, state.config.signup_grant_credits);
    state.store.put_profile(&profile)?;

    tracing::info!(
        user_id = %auth.user_id,
        credits = profile.credits,
        "profile created"
    );

    Ok(Json(ProfileResponse::from(&profile)))
}

/// Get the caller's profile and balance.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .store
        .get_profile(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    Ok(Json(ProfileResponse::from(&profile)))
}
