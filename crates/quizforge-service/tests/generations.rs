//! Generation integration tests, with the generation backend faked by
//! wiremock.

mod common;

use common::{auth_header_for, TestHarness};
use quizforge_core::UserId;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash-lite:generateContent";

/// Harness wired to a mock generation backend.
async fn harness_with_genai(genai: &MockServer) -> TestHarness {
    let uri = genai.uri();
    let harness = TestHarness::with_config(move |config| {
        config.genai_api_key = Some("test-genai-key".into());
        config.genai_api_url = uri;
    });

    // Model discovery; the preferred model is available.
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{
                "name": "models/gemini-2.5-flash-lite",
                "supportedGenerationMethods": ["generateContent"]
            }]
        })))
        .mount(genai)
        .await;

    harness
}

/// Mount a generation response whose single candidate is `text`.
async fn mount_generation_text(server: &MockServer, text: String) {
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })))
        .mount(server)
        .await;
}

fn quiz_questions_json() -> String {
    serde_json::json!([
        {
            "question": "What organelle produces ATP?",
            "options": ["Mitochondria", "Ribosome", "Nucleus", "Golgi apparatus"],
            "answer": "Mitochondria",
            "explanation": "Cellular respiration happens in the mitochondria."
        },
        {
            "question": "What is the basic unit of life?",
            "options": ["Atom", "Cell", "Tissue", "Organ"],
            "answer": "Cell"
        }
    ])
    .to_string()
}

fn cram_sheet_json() -> String {
    serde_json::json!({
        "summary": [
            { "topic": "ATP", "content": "Produced in mitochondria." },
            { "topic": "Cells", "content": "Basic unit of life." }
        ],
        "blitz_questions": [
            { "question": "Where is ATP produced?", "answer": "Mitochondria" },
            { "question": "Basic unit of life?", "answer": "The cell" },
            { "question": "What does DNA encode?", "answer": "Proteins" }
        ]
    })
    .to_string()
}

// ============================================================================
// Quiz generation
// ============================================================================

#[tokio::test]
async fn quiz_generation_debits_one_credit() {
    let genai = MockServer::start().await;
    let harness = harness_with_genai(&genai).await;
    harness.create_profile().await;
    mount_generation_text(&genai, quiz_questions_json()).await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({
            "document_text": "The mitochondria is the powerhouse of the cell.",
            "title": "Biology 101",
            "source_filename": "bio.pdf"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["title"], "Biology 101");
    assert_eq!(body["payload"]["kind"], "quiz");
    assert_eq!(body["payload"]["questions"].as_array().unwrap().len(), 2);

    assert_eq!(harness.balance().await, 2);

    // The record is listed for its owner.
    let response = harness
        .server
        .get("/v1/generations")
        .add_header("authorization", harness.auth_header())
        .await;
    response.assert_status_ok();
    let list: serde_json::Value = response.json();
    assert_eq!(list["generations"].as_array().unwrap().len(), 1);
    assert_eq!(list["generations"][0]["kind"], "quiz");
    assert_eq!(list["has_more"], false);
}

#[tokio::test]
async fn quiz_with_markdown_fences_still_parses() {
    let genai = MockServer::start().await;
    let harness = harness_with_genai(&genai).await;
    harness.create_profile().await;
    mount_generation_text(&genai, format!("```json\n{}\n```", quiz_questions_json())).await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;

    response.assert_status_ok();
    assert_eq!(harness.balance().await, 2);
}

#[tokio::test]
async fn backend_failure_refunds_the_debit() {
    let genai = MockServer::start().await;
    // Exactly one credit: the refund must restore it, and the error must
    // be a generation failure rather than insufficient credits.
    let uri = genai.uri();
    let harness = TestHarness::with_config(move |config| {
        config.genai_api_key = Some("test-genai-key".into());
        config.genai_api_url = uri;
        config.signup_grant_credits = 1;
    });
    harness.create_profile().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&genai)
        .await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&genai)
        .await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "generation_failed");

    assert_eq!(harness.balance().await, 1);

    let response = harness
        .server
        .get("/v1/generations")
        .add_header("authorization", harness.auth_header())
        .await;
    let list: serde_json::Value = response.json();
    assert!(list["generations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_model_output_refunds() {
    let genai = MockServer::start().await;
    let harness = harness_with_genai(&genai).await;
    harness.create_profile().await;
    mount_generation_text(&genai, "this is not json".into()).await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    assert_eq!(harness.balance().await, 3);
}

#[tokio::test]
async fn invalid_question_shape_refunds() {
    let genai = MockServer::start().await;
    let harness = harness_with_genai(&genai).await;
    harness.create_profile().await;

    // Parseable, but the answer matches none of the options.
    let bad = serde_json::json!([{
        "question": "q",
        "options": ["a", "b", "c", "d"],
        "answer": "e"
    }])
    .to_string();
    mount_generation_text(&genai, bad).await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    assert_eq!(harness.balance().await, 3);
}

#[tokio::test]
async fn insufficient_credits_is_payment_required() {
    let genai = MockServer::start().await;
    let uri = genai.uri();
    let harness = TestHarness::with_config(move |config| {
        config.genai_api_key = Some("test-genai-key".into());
        config.genai_api_url = uri;
        config.signup_grant_credits = 0;
    });
    harness.create_profile().await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], 0);
    assert_eq!(body["error"]["details"]["required"], 1);
}

#[tokio::test]
async fn empty_document_rejected_before_debit() {
    let genai = MockServer::start().await;
    let harness = harness_with_genai(&genai).await;
    harness.create_profile().await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "   " }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(harness.balance().await, 3);
}

// ============================================================================
// Cram generation
// ============================================================================

#[tokio::test]
async fn cram_generation_debits_three_credits() {
    let genai = MockServer::start().await;
    let harness = harness_with_genai(&genai).await;
    harness.create_profile().await;
    mount_generation_text(&genai, cram_sheet_json()).await;

    let response = harness
        .server
        .post("/v1/generations/cram")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({
            "document_text": "Everything about cells.",
            "title": "Final exam"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["payload"]["kind"], "cram");
    assert_eq!(body["payload"]["summary"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["payload"]["blitz_questions"].as_array().unwrap().len(),
        3
    );

    assert_eq!(harness.balance().await, 0);
}

#[tokio::test]
async fn cram_needs_three_credits() {
    let genai = MockServer::start().await;
    let uri = genai.uri();
    let harness = TestHarness::with_config(move |config| {
        config.genai_api_key = Some("test-genai-key".into());
        config.genai_api_url = uri;
        config.signup_grant_credits = 2;
    });
    harness.create_profile().await;

    let response = harness
        .server
        .post("/v1/generations/cram")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["details"]["balance"], 2);
    assert_eq!(body["error"]["details"]["required"], 3);
    assert_eq!(harness.balance().await, 2);
}

// ============================================================================
// Retrieval and ownership
// ============================================================================

#[tokio::test]
async fn generation_is_private_to_its_owner() {
    let genai = MockServer::start().await;
    let harness = harness_with_genai(&genai).await;
    harness.create_profile().await;
    mount_generation_text(&genai, quiz_questions_json()).await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;
    response.assert_status_ok();
    let created: serde_json::Value = response.json();
    let id = created["id"].as_str().unwrap();

    // The owner can fetch it.
    let response = harness
        .server
        .get(&format!("/v1/generations/{id}"))
        .add_header("authorization", harness.auth_header())
        .await;
    response.assert_status_ok();

    // Another user cannot tell it exists.
    let other = UserId::generate();
    harness
        .server
        .post("/v1/profiles")
        .add_header("authorization", auth_header_for(other))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get(&format!("/v1/generations/{id}"))
        .add_header("authorization", auth_header_for(other))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn invalid_generation_id_is_bad_request() {
    let harness = TestHarness::new();
    harness.create_profile().await;

    let response = harness
        .server
        .get("/v1/generations/not-a-ulid")
        .add_header("authorization", harness.auth_header())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn generation_without_backend_is_unavailable() {
    let harness = TestHarness::new(); // no genai configured
    harness.create_profile().await;

    let response = harness
        .server
        .post("/v1/generations/quiz")
        .add_header("authorization", harness.auth_header())
        .json(&serde_json::json!({ "document_text": "doc" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    assert_eq!(harness.balance().await, 3);
}
