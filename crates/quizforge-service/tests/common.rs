//! Common test utilities for quizforge integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use tempfile::TempDir;

use quizforge_core::UserId;
use quizforge_service::auth::Claims;
use quizforge_service::{create_router, AppState, ServiceConfig};
use quizforge_store::RocksStore;

/// Auth secret shared between the harness and minted tokens.
pub const AUTH_SECRET: &str = "test-auth-secret";

/// Webhook signing secret shared between the harness and signed payloads.
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and default config.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness after applying overrides to the default test
    /// config (e.g. pointing Stripe or the generation backend at a
    /// wiremock server).
    pub fn with_config(overrides: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_secret: AUTH_SECRET.into(),
            auth_audience: "quizforge".into(),
            stripe_api_key: Some("sk_test_key".into()),
            stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
            signup_grant_credits: 3,
            ..ServiceConfig::default()
        };
        overrides(&mut config);

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Get the authorization header for the harness's test user.
    pub fn auth_header(&self) -> String {
        auth_header_for(self.test_user_id)
    }

    /// Create the test user's profile (signup grant applied).
    pub async fn create_profile(&self) {
        self.server
            .post("/v1/profiles")
            .add_header("authorization", self.auth_header())
            .await
            .assert_status_ok();
    }

    /// Current balance of the test user.
    pub async fn balance(&self) -> i64 {
        let response = self
            .server
            .get("/v1/profiles/me")
            .add_header("authorization", self.auth_header())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["credits"].as_i64().unwrap()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a bearer header for an arbitrary user.
pub fn auth_header_for(user_id: UserId) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        aud: "quizforge".into(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(AUTH_SECRET.as_bytes()),
    )
    .expect("Failed to mint test token");
    format!("Bearer {token}")
}

/// Build a valid `stripe-signature` header for a webhook body.
pub fn sign_webhook(body: &str) -> String {
    let timestamp = 1_700_000_000_i64;
    let signature = hmac_sha256_hex(WEBHOOK_SECRET, &format!("{timestamp}.{body}"));
    format!("t={timestamp},v1={signature}")
}

/// Minimal HMAC-SHA256 for signing test webhook payloads.
fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    use sha2::{Digest, Sha256};

    const BLOCK_SIZE: usize = 64;

    let mut key = [0u8; BLOCK_SIZE];
    let secret = secret.as_bytes();
    assert!(secret.len() <= BLOCK_SIZE, "test secrets fit a block");
    key[..secret.len()].copy_from_slice(secret);

    let mut inner = Sha256::new();
    inner.update(key.map(|b| b ^ 0x36));
    inner.update(message.as_bytes());
    let inner_hash = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(key.map(|b| b ^ 0x5c));
    outer.update(inner_hash);

    hex::encode(outer.finalize())
}

/// Build a completed-checkout webhook body for a session and user.
pub fn checkout_completed_body(session_id: &str, user_id: UserId) -> String {
    serde_json::json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_status": "paid",
                "metadata": { "userId": user_id.to_string() }
            }
        }
    })
    .to_string()
}
