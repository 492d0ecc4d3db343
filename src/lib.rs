//! # cv-review
//!
//! Review a CV with OCR and a chat model, then keep asking it questions.
//!
//! A document (PDF, JPEG or PNG) is sent to a remote OCR service; the text it
//! returns seeds a conversation with a chat-completion model that critiques
//! the CV and answers follow-ups. The crate is the session bookkeeping around
//! those two calls.
//!
//! ## Flow
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Input   validate extension + magic bytes
//!  ├─ 2. Encode  bytes → base64 data URL
//!  ├─ 3. OCR     mistral-ocr-latest → per-page markdown, joined
//!  └─ 4. Chat    system prompt + greeting + review request → reply
//!                 then one exchange per user question
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cv_review::{CvAssistant, ReviewConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MISTRAL_API_KEY (a .env file is honoured)
//!     let config = ReviewConfig::from_env()?.build()?;
//!     let mut assistant = CvAssistant::connect(config)?;
//!
//!     let text = assistant.ingest_path("cv.pdf").await?;
//!     assistant.start_chat(&text).await?;
//!     println!("{}", assistant.session().transcript().last_reply().unwrap_or_default());
//!
//!     let answer = assistant.send_message("How should I reword my title?").await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cv-review` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assistant;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod transcript;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assistant::CvAssistant;
pub use config::{ReviewConfig, ReviewConfigBuilder};
pub use error::{ChatError, ConfigError, ExportError, IngestionError};
pub use pipeline::input::{read_upload, MediaType, Upload, ACCEPTED_EXTENSIONS};
pub use pipeline::llm::{ChatClient, ProviderChatClient};
pub use pipeline::ocr::{MistralOcrClient, OcrClient, OcrPage, OcrRequest, OcrResponse};
pub use progress::{NoopProgressCallback, ProgressCallback, ReviewProgressCallback};
pub use session::{Session, SessionState};
pub use transcript::{Message, Role, Transcript};
