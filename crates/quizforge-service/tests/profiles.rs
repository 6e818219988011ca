//! Profile integration tests.

mod common;

use common::{auth_header_for, TestHarness};
use quizforge_core::UserId;

#[tokio::test]
async fn create_profile_applies_signup_grant() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/profiles")
        .add_header("authorization", harness.auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 3);
    assert_eq!(body["user_id"], harness.test_user_id.to_string());
}

#[tokio::test]
async fn repeated_signup_does_not_reset_balance() {
    let harness = TestHarness::new();
    harness.create_profile().await;

    // Second signup call returns the existing profile untouched.
    let response = harness
        .server
        .post("/v1/profiles")
        .add_header("authorization", harness.auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits"], 3);
    assert_eq!(harness.balance().await, 3);
}

#[tokio::test]
async fn get_profile_without_account_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/profiles/me")
        .add_header("authorization", harness.auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn get_profile_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/profiles/me").await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn garbage_token_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/profiles/me")
        .add_header("authorization", "Bearer not-a-jwt")
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn profiles_are_per_user() {
    let harness = TestHarness::new();
    harness.create_profile().await;

    // A different user has no profile yet.
    let response = harness
        .server
        .get("/v1/profiles/me")
        .add_header("authorization", auth_header_for(UserId::generate()))
        .await;

    response.assert_status_not_found();
}
