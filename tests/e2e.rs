//! End-to-end tests against the live Mistral APIs.
//!
//! Gated behind `E2E_ENABLED` (and `MISTRAL_API_KEY`) so they never run in
//! CI unless explicitly requested. They need a sample CV at
//! `./test_cases/sample_cv.pdf`.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use cv_review::{
    CvAssistant, IngestionError, MistralOcrClient, ProviderChatClient, ReviewConfig, Role,
    SessionState,
};
use edgequake_llm::MockProvider;
use std::path::PathBuf;
use std::sync::Arc;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test unless E2E_ENABLED and MISTRAL_API_KEY are set and the file at `path` exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if std::env::var("MISTRAL_API_KEY").is_err() {
            println!("SKIP — MISTRAL_API_KEY not set");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn live_assistant() -> CvAssistant {
    let config = ReviewConfig::from_env()
        .expect("MISTRAL_API_KEY checked above")
        .api_timeout_secs(120)
        .build()
        .expect("valid config");
    CvAssistant::connect(config).expect("clients should build")
}

#[tokio::test]
async fn test_review_sample_cv() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_cv.pdf"));
    let mut assistant = live_assistant();

    let text = assistant
        .ingest_path(&path)
        .await
        .expect("OCR should extract text");
    assert!(!text.trim().is_empty());
    assert_eq!(assistant.state(), SessionState::Chatting);

    assistant
        .start_chat(&text)
        .await
        .expect("initial review should succeed");
    let transcript = assistant.session().transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript.messages()[3].role, Role::Assistant);
    println!(
        "--- BEGIN REVIEW ---\n{}\n--- END REVIEW ---",
        transcript.messages()[3].content
    );

    let answer = assistant
        .send_message("Suggest a better professional title in one line.")
        .await
        .expect("follow-up should succeed");
    assert!(!answer.trim().is_empty());
    assert_eq!(assistant.session().transcript().len(), 6);
}

#[tokio::test]
async fn test_bad_key_is_reported_as_auth_error() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_cv.pdf"));
    let config = ReviewConfig::builder()
        .api_key("definitely-not-a-key")
        .build()
        .expect("valid config");
    // MistralProvider::new exports its key to MISTRAL_API_KEY; keep the bad
    // key away from the chat side.
    let ocr = MistralOcrClient::new(&config).expect("client should build");
    let chat = ProviderChatClient::new(Arc::new(MockProvider::new()), &config);
    let mut assistant = CvAssistant::new(config, Arc::new(ocr), Arc::new(chat));

    let err = assistant.ingest_path(&path).await.unwrap_err();
    assert!(
        matches!(err, IngestionError::AuthError { .. }),
        "expected auth error, got {err:?}"
    );
    assert_eq!(assistant.state(), SessionState::Uploading);
}
