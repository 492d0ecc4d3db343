//! Upload encoding: raw bytes → base64 data URL wrapped in a [`DocumentDescriptor`].
//!
//! The OCR API takes documents inline as `data:` URLs. PDFs travel in a
//! `document_url` descriptor, images in an `image_url` descriptor; the
//! payload is standard (padded) base64.

use crate::pipeline::input::Upload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::debug;

/// The `document` field of an OCR request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentDescriptor {
    DocumentUrl { document_url: String },
    ImageUrl { image_url: String },
}

impl DocumentDescriptor {
    pub fn url(&self) -> &str {
        match self {
            DocumentDescriptor::DocumentUrl { document_url } => document_url,
            DocumentDescriptor::ImageUrl { image_url } => image_url,
        }
    }
}

/// Build a `data:<mime>;base64,<payload>` URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Encode an upload as the descriptor the OCR endpoint expects.
pub fn encode_upload(upload: &Upload) -> DocumentDescriptor {
    let url = data_url(upload.media_type.mime(), &upload.bytes);
    debug!("Encoded {} → {} bytes data URL", upload.file_name, url.len());

    if upload.media_type.is_image() {
        DocumentDescriptor::ImageUrl { image_url: url }
    } else {
        DocumentDescriptor::DocumentUrl { document_url: url }
    }
}
