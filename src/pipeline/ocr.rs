//! OCR stage: send the encoded document to the OCR endpoint and join page text.
//!
//! [`OcrClient`] is the seam between the session logic and the network: the
//! production [`MistralOcrClient`] POSTs JSON with `reqwest`, tests plug in a
//! scripted implementation.

use crate::config::ReviewConfig;
use crate::error::{ConfigError, IngestionError};
use crate::pipeline::encode::DocumentDescriptor;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Body of an OCR request.
#[derive(Debug, Clone, Serialize)]
pub struct OcrRequest {
    pub model: String,
    pub document: DocumentDescriptor,
    pub include_image_base64: bool,
}

/// One page of an OCR result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OcrPage {
    #[serde(default)]
    pub index: usize,
    /// Markdown for the page; absent when nothing could be read.
    #[serde(default)]
    pub markdown: Option<String>,
}

impl OcrPage {
    /// Page text, if it carries any non-blank content.
    pub fn text(&self) -> Option<&str> {
        self.markdown.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OcrUsage {
    #[serde(default)]
    pub pages_processed: Option<u32>,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

/// Result of an OCR call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub pages: Vec<OcrPage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage_info: Option<OcrUsage>,
}

impl OcrResponse {
    /// Number of pages with text.
    pub fn text_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.text().is_some()).count()
    }

    /// Join page texts with `\n` in page order, skipping textless pages.
    ///
    /// Fails with [`IngestionError::NoExtractableText`] when no page has text.
    pub fn extracted_text(&self) -> Result<String, IngestionError> {
        let texts: Vec<&str> = self.pages.iter().filter_map(OcrPage::text).collect();
        if texts.is_empty() {
            return Err(IngestionError::NoExtractableText {
                pages: self.pages.len(),
            });
        }
        Ok(texts.join("\n"))
    }
}

/// Remote OCR capability.
#[async_trait]
pub trait OcrClient: Send + Sync {
    async fn process(&self, request: &OcrRequest) -> Result<OcrResponse, IngestionError>;
}

/// OCR client for the Mistral `/ocr` endpoint.
#[derive(Clone)]
pub struct MistralOcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for MistralOcrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralOcrClient")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl MistralOcrClient {
    pub fn new(config: &ReviewConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/ocr", config.api_base_url),
            api_key: config.api_key.clone(),
            timeout_secs: config.api_timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl OcrClient for MistralOcrClient {
    async fn process(&self, request: &OcrRequest) -> Result<OcrResponse, IngestionError> {
        info!("OCR request: model={} → {}", request.model, self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IngestionError::OcrTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    IngestionError::OcrRequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                IngestionError::OcrTimeout {
                    secs: self.timeout_secs,
                }
            } else {
                IngestionError::OcrRequestFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!("OCR endpoint returned {}: {}", status, message);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    IngestionError::AuthError { detail: message }
                }
                _ => IngestionError::OcrApiError {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: OcrResponse =
            serde_json::from_slice(&body).map_err(|e| IngestionError::MalformedResponse {
                detail: e.to_string(),
            })?;

        debug!(
            "OCR response: {} page(s), usage {:?}",
            parsed.pages.len(),
            parsed.usage_info
        );
        Ok(parsed)
    }
}

/// Pull a readable message out of an error body.
///
/// The API answers errors with either `{"message": ".."}` or
/// `{"detail": ".."}`; anything else is returned as (truncated) text.
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: Option<serde_json::Value>,
        detail: Option<serde_json::Value>,
    }

    if let Ok(err) = serde_json::from_slice::<ApiError>(body) {
        if let Some(v) = err.message.or(err.detail) {
            return match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "<empty body>".to_string()
    } else if text.chars().count() > 200 {
        format!("{}\u{2026}", text.chars().take(199).collect::<String>())
    } else {
        text.to_string()
    }
}
