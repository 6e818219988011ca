//! QuizForge HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::{ApiErrorResponse, ClientError};
use crate::types::{
    CheckoutResponse, ConfirmPaymentResponse, GenerateCramRequest, GenerateQuizRequest,
    GenerationListResponse, GenerationResponse, ProfileResponse,
};

/// QuizForge API client, acting as one signed-in user.
#[derive(Debug, Clone)]
pub struct QuizForgeClient {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl QuizForgeClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g. `"http://quizforge:8080"`)
    /// * `bearer_token` - The user's JWT
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    /// Create the user's profile (idempotent; applies the signup grant).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn create_profile(&self) -> Result<ProfileResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/v1/profiles", self.base_url))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch the user's profile and balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_profile(&self) -> Result<ProfileResponse, ClientError> {
        let response = self
            .client
            .get(format!("{}/v1/profiles/me", self.base_url))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Generate a quiz (1 credit).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an
    /// error; `insufficient_credits` is detectable via
    /// [`ClientError::is_insufficient_credits`].
    pub async fn generate_quiz(
        &self,
        request: &GenerateQuizRequest,
    ) -> Result<GenerationResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/v1/generations/quiz", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Generate a cram pack (3 credits).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn generate_cram(
        &self,
        request: &GenerateCramRequest,
    ) -> Result<GenerationResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/v1/generations/cram", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// List the user's generations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_generations(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<GenerationListResponse, ClientError> {
        let response = self
            .client
            .get(format!("{}/v1/generations", self.base_url))
            .query(&[("limit", limit), ("offset", offset)])
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch one generation by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_generation(&self, id: &str) -> Result<GenerationResponse, ClientError> {
        let response = self
            .client
            .get(format!("{}/v1/generations/{}", self.base_url, id))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Create a checkout session for the credit pack.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn create_checkout(&self) -> Result<CheckoutResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/v1/payments/checkout", self.base_url))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Confirm a payment after returning from checkout.
    ///
    /// `already_processed: true` in the response means the webhook won the
    /// race; it is a success, not a failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn confirm_payment(
        &self,
        session_id: &str,
    ) -> Result<ConfirmPaymentResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/v1/payments/confirm", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(&serde_json::json!({ "session_id": session_id }))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Decode a success body or convert a structured error response.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, body = %body, "API call failed");
        match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(parsed) => Err(ClientError::Api {
                status: status.as_u16(),
                code: parsed.error.code,
                message: parsed.error.message,
            }),
            Err(_) => Err(ClientError::Api {
                status: status.as_u16(),
                code: "unknown".into(),
                message: format!("HTTP {status}"),
            }),
        }
    }
}
