//! Client SDK for the QuizForge service.
//!
//! Used by the web frontend's server runtime to call the API on behalf of
//! a signed-in user. The client holds the user's bearer token; every call
//! is made in that user's authority.
//!
//! # Example
//!
//! ```no_run
//! use quizforge_client::QuizForgeClient;
//!
//! # async fn example() -> Result<(), quizforge_client::ClientError> {
//! let client = QuizForgeClient::new("http://localhost:8080", "user-jwt");
//!
//! let profile = client.get_profile().await?;
//! println!("credits: {}", profile.credits);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod types;

pub use client::QuizForgeClient;
pub use error::ClientError;
pub use types::{
    CheckoutResponse, ConfirmPaymentResponse, GenerateCramRequest, GenerateQuizRequest,
    GenerationListResponse, GenerationResponse, GenerationSummary, ProfileResponse,
};
