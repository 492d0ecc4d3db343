//! Error types for the cv-review library.
//!
//! Each failure domain gets its own enum so callers can pattern-match on the
//! step that went wrong:
//!
//! * [`IngestionError`] — the upload could not be turned into text (bad file,
//!   OCR call failed, or OCR found nothing to read). The session stays in the
//!   upload state.
//!
//! * [`ChatError`] — a chat turn could not be completed. The transcript is
//!   left exactly as it was before the turn.
//!
//! * [`ConfigError`] — startup configuration is unusable (missing API key,
//!   out-of-range values). Fatal: the front end must stop before showing any UI.
//!
//! * [`ExportError`] — writing the transcript to disk failed.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn an uploaded document into text.
#[derive(Debug, Error)]
pub enum IngestionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Upload path does not exist.
    #[error("CV file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed.
    #[error("Could not read '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extension is not one of pdf, jpg, jpeg, png.
    #[error("Unsupported file type '{extension}' for '{name}'\nAccepted: pdf, jpg, jpeg, png.")]
    UnsupportedMediaType { name: String, extension: String },

    /// Zero-byte upload.
    #[error("'{name}' is empty")]
    EmptyFile { name: String },

    /// Leading bytes do not match the declared media type.
    #[error("'{name}' is not a valid {expected} file\nFirst bytes: {magic:?}")]
    ContentMismatch {
        name: String,
        expected: &'static str,
        magic: Vec<u8>,
    },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// Transport-level failure talking to the OCR endpoint.
    #[error("OCR request failed: {reason}")]
    OcrRequestFailed { reason: String },

    /// OCR endpoint did not answer within the configured timeout.
    #[error("OCR call timed out after {secs}s\nIncrease --api-timeout.")]
    OcrTimeout { secs: u64 },

    /// OCR endpoint rejected the credential (401/403).
    #[error("OCR authentication failed: {detail}\nCheck MISTRAL_API_KEY.")]
    AuthError { detail: String },

    /// OCR endpoint returned a non-success status.
    #[error("OCR API error (status {status}): {message}")]
    OcrApiError { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Malformed OCR response: {detail}")]
    MalformedResponse { detail: String },

    /// OCR succeeded but none of the pages carried text.
    #[error("Could not extract text from the document ({pages} page(s) returned, none with text)")]
    NoExtractableText { pages: usize },

    // ── State errors ──────────────────────────────────────────────────────
    /// A document was already ingested; reset before uploading another.
    #[error("A CV has already been analysed in this session; reset to upload another")]
    AlreadyIngested,
}

/// Failure to complete one chat exchange.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No conversation exists yet (no CV ingested, or `start_chat` not run).
    #[error("No conversation in progress; upload a CV first")]
    NotStarted,

    /// `start_chat` was called on a session that already has a transcript.
    #[error("The conversation has already been started")]
    AlreadyStarted,

    /// The user message was blank.
    #[error("Message is empty")]
    EmptyMessage,

    /// The chat provider returned an error (auth, network, bad request).
    #[error("Chat API error: {message}")]
    ApiError { message: String },

    /// The chat call did not finish within the configured timeout.
    #[error("Chat call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model answered with no content.
    #[error("Chat model returned an empty reply")]
    EmptyReply,
}

/// Fatal startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential is absent from the environment.
    #[error("{var} environment variable is not set.\nExport it or add it to a .env file.")]
    MissingCredential { var: &'static str },

    /// The chat provider could not be constructed (unknown name, missing key).
    #[error("Chat provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The HTTP client for the OCR endpoint could not be built.
    #[error("Failed to initialise HTTP client: {0}")]
    HttpClient(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Writing the transcript export failed.
#[derive(Debug, Error)]
#[error("Failed to write transcript '{path}': {source}")]
pub struct ExportError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_text_display() {
        let e = IngestionError::NoExtractableText { pages: 3 };
        assert!(e.to_string().contains("3 page(s)"), "got: {e}");
    }

    #[test]
    fn ocr_api_error_display() {
        let e = IngestionError::OcrApiError {
            status: 422,
            message: "invalid document".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("invalid document"));
    }

    #[test]
    fn missing_credential_display() {
        let e = ConfigError::MissingCredential {
            var: "MISTRAL_API_KEY",
        };
        assert!(e.to_string().starts_with("MISTRAL_API_KEY"));
    }

    #[test]
    fn chat_timeout_display() {
        let e = ChatError::Timeout { secs: 45 };
        assert!(e.to_string().contains("45s"));
    }
}
