//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/quizforge").
    pub data_dir: String,

    /// Shared secret for HS256 bearer tokens issued by the auth provider.
    pub auth_secret: String,

    /// Expected JWT audience (default: "quizforge").
    pub auth_audience: String,

    /// Stripe API key (optional; payments disabled without it).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret (optional).
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL (overridable for tests).
    pub stripe_api_url: String,

    /// Generation backend API key (optional; generation disabled without it).
    pub genai_api_key: Option<String>,

    /// Generation backend base URL (overridable for tests).
    pub genai_api_url: String,

    /// Model to fall back on when discovery fails.
    pub genai_model: String,

    /// How long a discovered model name stays cached, in seconds.
    pub genai_model_cache_ttl_seconds: u64,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Credits granted to a newly created profile.
    pub signup_grant_credits: i64,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/quizforge".into()),
            auth_secret: std::env::var("AUTH_SECRET").unwrap_or_else(|_| {
                tracing::warn!("AUTH_SECRET not set - using insecure development secret");
                "insecure-dev-secret".into()
            }),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "quizforge".into()),
            stripe_api_key,
            stripe_webhook_secret,
            stripe_api_url: std::env::var("STRIPE_API_URL")
                .unwrap_or_else(|_| "https://api.stripe.com/v1".into()),
            genai_api_key: std::env::var("GENAI_API_KEY").ok(),
            genai_api_url: std::env::var("GENAI_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            genai_model: std::env::var("GENAI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-lite".into()),
            genai_model_cache_ttl_seconds: std::env::var("GENAI_MODEL_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            signup_grant_credits: std::env::var("SIGNUP_GRANT_CREDITS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/quizforge".into(),
            auth_secret: "insecure-dev-secret".into(),
            auth_audience: "quizforge".into(),
            stripe_api_key: None,
            stripe_webhook_secret: None,
            stripe_api_url: "https://api.stripe.com/v1".into(),
            genai_api_key: None,
            genai_api_url: "https://generativelanguage.googleapis.com".into(),
            genai_model: "gemini-2.5-flash-lite".into(),
            genai_model_cache_ttl_seconds: 3600,
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 60,
            signup_grant_credits: 3,
        }
    }
}
