//! Router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{generations, health, payments, profiles, webhooks};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Profiles (bearer auth)
/// - `POST /v1/profiles` - Create the caller's profile (signup grant)
/// - `GET /v1/profiles/me` - Profile and credit balance
///
/// ## Generations (bearer auth)
/// - `POST /v1/generations/quiz` - Generate a quiz (1 credit)
/// - `POST /v1/generations/cram` - Generate a cram pack (3 credits)
/// - `GET /v1/generations` - List own generations
/// - `GET /v1/generations/{id}` - Fetch one generation
///
/// ## Payments (bearer auth)
/// - `POST /v1/payments/checkout` - Create a checkout session
/// - `POST /v1/payments/confirm` - Client-return payment confirmation
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe` - Payment processor webhooks
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Profiles
        .route("/v1/profiles", post(profiles::create_profile))
        .route("/v1/profiles/me", get(profiles::get_profile))
        // Generations
        .route("/v1/generations/quiz", post(generations::generate_quiz))
        .route("/v1/generations/cram", post(generations::generate_cram))
        .route("/v1/generations", get(generations::list_generations))
        .route("/v1/generations/:id", get(generations::get_generation))
        // Payments
        .route("/v1/payments/checkout", post(payments::create_checkout))
        .route("/v1/payments/confirm", post(payments::confirm_payment))
        // Webhooks
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
