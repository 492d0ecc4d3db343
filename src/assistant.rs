//! The review controller: one session, one OCR client, one chat client.
//!
//! [`CvAssistant`] owns the [`Session`] and exposes the four operations a
//! front end needs: [`ingest`](CvAssistant::ingest),
//! [`start_chat`](CvAssistant::start_chat),
//! [`send_message`](CvAssistant::send_message) and
//! [`reset`](CvAssistant::reset). Each takes `&mut self`, so a session is
//! only ever driven by one caller at a time and needs no locking.
//!
//! Chat exchanges are all-or-nothing: the user turn is committed together
//! with its reply, so a failed call leaves the transcript as it was.

use crate::config::ReviewConfig;
use crate::error::{ChatError, ConfigError, ExportError, IngestionError};
use crate::pipeline::encode::encode_upload;
use crate::pipeline::input::{read_upload, Upload};
use crate::pipeline::llm::{ChatClient, ProviderChatClient};
use crate::pipeline::ocr::{MistralOcrClient, OcrClient, OcrRequest};
use crate::prompts::{review_request, GREETING, SYSTEM_PROMPT};
use crate::session::{Session, SessionState};
use crate::transcript::{Message, Transcript};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives one review session against remote OCR and chat services.
pub struct CvAssistant {
    config: ReviewConfig,
    ocr: Arc<dyn OcrClient>,
    chat: Arc<dyn ChatClient>,
    session: Session,
}

impl CvAssistant {
    /// Build an assistant around caller-supplied clients.
    pub fn new(config: ReviewConfig, ocr: Arc<dyn OcrClient>, chat: Arc<dyn ChatClient>) -> Self {
        Self {
            config,
            ocr,
            chat,
            session: Session::new(),
        }
    }

    /// Build an assistant with the production clients: Mistral OCR over
    /// HTTP and the edgequake-llm provider named in the config.
    pub fn connect(config: ReviewConfig) -> Result<Self, ConfigError> {
        let ocr = Arc::new(MistralOcrClient::new(&config)?);
        let chat = Arc::new(ProviderChatClient::from_config(&config)?);
        info!(
            "Connected: ocr={} chat={}/{}",
            config.ocr_model, config.chat_provider, config.chat_model
        );
        Ok(Self::new(config, ocr, chat))
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Read a file from disk and ingest it.
    pub async fn ingest_path(&mut self, path: impl AsRef<Path>) -> Result<String, IngestionError> {
        if self.session.ocr_done() {
            return Err(IngestionError::AlreadyIngested);
        }
        let upload = match read_upload(path).await {
            Ok(upload) => upload,
            Err(e) => {
                self.notify_ingest_error(&e);
                return Err(e);
            }
        };
        self.ingest(upload).await
    }

    /// Run OCR on an upload and record its text in the session.
    ///
    /// On success the session moves to `Chatting` and the joined page text is
    /// returned. On failure the session stays in `Uploading`.
    pub async fn ingest(&mut self, upload: Upload) -> Result<String, IngestionError> {
        if self.session.ocr_done() {
            return Err(IngestionError::AlreadyIngested);
        }

        let start = Instant::now();
        info!(
            "Ingesting {} ({} bytes, {})",
            upload.file_name,
            upload.len(),
            upload.media_type.mime()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_ingest_start(&upload.file_name, upload.len());
        }

        let request = OcrRequest {
            model: self.config.ocr_model.clone(),
            document: encode_upload(&upload),
            include_image_base64: self.config.include_image_base64,
        };

        let ingesting = self.session.begin_ingest();
        let result = match self.ocr.process(&request).await {
            Ok(response) => response
                .extracted_text()
                .map(|text| (response.text_pages(), text)),
            Err(e) => Err(e),
        };

        match result {
            Ok((pages, text)) => {
                info!(
                    "OCR complete: {} page(s) with text, {} chars, {}ms",
                    pages,
                    text.len(),
                    start.elapsed().as_millis()
                );
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_ingest_complete(pages, text.len());
                }
                ingesting.complete(text.clone());
                Ok(text)
            }
            Err(e) => {
                drop(ingesting);
                warn!("Ingestion of {} failed: {}", upload.file_name, e);
                self.notify_ingest_error(&e);
                Err(e)
            }
        }
    }

    /// Open the conversation and, when `seed_text` is non-empty, request the
    /// initial review of it.
    ///
    /// The transcript always starts with the system prompt and the greeting.
    /// If the review call fails, the error is returned and the transcript keeps
    /// only those two entries; the user can still ask questions.
    pub async fn start_chat(&mut self, seed_text: &str) -> Result<(), ChatError> {
        if self.session.state() != SessionState::Chatting {
            return Err(ChatError::NotStarted);
        }
        if !self.session.transcript().is_empty() {
            return Err(ChatError::AlreadyStarted);
        }

        let system_prompt = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(SYSTEM_PROMPT);
        self.session
            .open_transcript(Transcript::opened(system_prompt, GREETING));
        debug!("Transcript opened");

        if seed_text.is_empty() {
            return Ok(());
        }

        self.exchange(review_request(seed_text)).await.map(|_| ())
    }

    /// Ask a follow-up question; returns the model's reply.
    pub async fn send_message(&mut self, text: &str) -> Result<String, ChatError> {
        if self.session.transcript().is_empty() {
            return Err(ChatError::NotStarted);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.exchange(text.to_string()).await
    }

    /// Discard the session: OCR text, transcript, everything.
    pub fn reset(&mut self) {
        info!("Session reset");
        self.session.reset();
    }

    /// Write the visible conversation and the OCR text as pretty JSON.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn save_transcript(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let export = TranscriptExport {
            ocr_text: self.session.ocr_text(),
            messages: self.session.transcript().visible().collect(),
        };
        let json = serde_json::to_vec_pretty(&export).map_err(|e| ExportError {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExportError {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|e| ExportError {
                path: path.to_path_buf(),
                source: e,
            })?;

        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| ExportError {
                path: path.to_path_buf(),
                source: e,
            })?;

        info!("Transcript saved to {}", path.display());
        Ok(())
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Send transcript + pending user turn; commit both only on success.
    async fn exchange(&mut self, user_text: String) -> Result<String, ChatError> {
        let request = self.session.transcript().with_pending(&user_text);
        let start = Instant::now();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_reply_start(request.len());
        }

        match self.chat.complete(&request, self.config.temperature).await {
            Ok(reply) => {
                info!(
                    "Reply received: {} chars in {}ms",
                    reply.len(),
                    start.elapsed().as_millis()
                );
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_reply_complete(reply.len());
                }
                self.session
                    .transcript_mut()
                    .commit_exchange(user_text, reply.clone());
                Ok(reply)
            }
            Err(e) => {
                warn!("Chat turn failed, transcript unchanged: {}", e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_reply_error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    fn notify_ingest_error(&self, e: &IngestionError) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_ingest_error(&e.to_string());
        }
    }
}

#[derive(Serialize)]
struct TranscriptExport<'a> {
    ocr_text: &'a str,
    messages: Vec<&'a Message>,
}
