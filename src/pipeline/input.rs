//! Input resolution: turn a user-supplied file into a validated [`Upload`].
//!
//! The OCR endpoint charges per call and answers slowly, so obviously wrong
//! input is rejected here: unknown extensions, empty files, and files whose
//! leading bytes disagree with their extension (a `.pdf` that is really a
//! PNG, a `.jpg` that is a text file).

use crate::error::IngestionError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions the front end accepts.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Declared type of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
}

impl MediaType {
    /// Map a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(MediaType::Pdf),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, MediaType::Pdf)
    }

    fn label(&self) -> &'static str {
        match self {
            MediaType::Pdf => "PDF",
            MediaType::Jpeg => "JPEG",
            MediaType::Png => "PNG",
        }
    }
}

/// A document ready for OCR.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Wrap in-memory bytes, checking they are non-empty and match `media_type`.
    pub fn from_bytes(
        file_name: impl Into<String>,
        media_type: MediaType,
        bytes: Vec<u8>,
    ) -> Result<Self, IngestionError> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(IngestionError::EmptyFile { name: file_name });
        }
        check_signature(&file_name, media_type, &bytes)?;
        Ok(Self {
            file_name,
            media_type,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read and validate an upload from disk.
pub async fn read_upload(path: impl AsRef<Path>) -> Result<Upload, IngestionError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let media_type = MediaType::from_extension(&extension).ok_or_else(|| {
        IngestionError::UnsupportedMediaType {
            name: file_name.clone(),
            extension: if extension.is_empty() {
                "<none>".to_string()
            } else {
                extension.clone()
            },
        }
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| map_io_error(path.to_path_buf(), e))?;

    debug!(
        "Read upload {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        media_type.mime()
    );

    Upload::from_bytes(file_name, media_type, bytes)
}

fn map_io_error(path: PathBuf, e: std::io::Error) -> IngestionError {
    match e.kind() {
        std::io::ErrorKind::NotFound => IngestionError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => IngestionError::PermissionDenied { path },
        _ => IngestionError::Unreadable { path, source: e },
    }
}

/// Verify magic bytes against the declared type.
fn check_signature(name: &str, media_type: MediaType, bytes: &[u8]) -> Result<(), IngestionError> {
    let ok = match media_type {
        MediaType::Pdf => bytes.starts_with(b"%PDF"),
        MediaType::Jpeg => matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg)),
        MediaType::Png => matches!(image::guess_format(bytes), Ok(ImageFormat::Png)),
    };
    if ok {
        Ok(())
    } else {
        Err(IngestionError::ContentMismatch {
            name: name.to_string(),
            expected: media_type.label(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn extension_mapping() {
        assert_eq!(MediaType::from_extension("PDF"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_extension("jpg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_extension("jpeg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_extension("png"), Some(MediaType::Png));
        assert_eq!(MediaType::from_extension("docx"), None);
        assert_eq!(MediaType::from_extension(""), None);
    }

    #[test]
    fn every_accepted_extension_maps() {
        for ext in ACCEPTED_EXTENSIONS {
            assert!(MediaType::from_extension(ext).is_some(), "{ext}");
        }
    }

    #[test]
    fn from_bytes_accepts_matching_signatures() {
        assert!(Upload::from_bytes("cv.pdf", MediaType::Pdf, b"%PDF-1.7\n".to_vec()).is_ok());
        assert!(Upload::from_bytes("cv.png", MediaType::Png, PNG_MAGIC.to_vec()).is_ok());
        assert!(Upload::from_bytes("cv.jpg", MediaType::Jpeg, JPEG_MAGIC.to_vec()).is_ok());
    }

    #[test]
    fn from_bytes_rejects_empty() {
        let err = Upload::from_bytes("cv.pdf", MediaType::Pdf, Vec::new()).unwrap_err();
        assert!(matches!(err, IngestionError::EmptyFile { .. }));
    }

    #[test]
    fn from_bytes_rejects_mismatch() {
        let err = Upload::from_bytes("cv.pdf", MediaType::Pdf, PNG_MAGIC.to_vec()).unwrap_err();
        match err {
            IngestionError::ContentMismatch { expected, magic, .. } => {
                assert_eq!(expected, "PDF");
                assert_eq!(magic, vec![0x89, b'P', b'N', b'G']);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_upload_missing_file() {
        let err = read_upload("/definitely/not/here/cv.pdf").await.unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn read_upload_rejects_unknown_extension() {
        let err = read_upload("resume.docx").await.unwrap_err();
        match err {
            IngestionError::UnsupportedMediaType { extension, .. } => assert_eq!(extension, "docx"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.PNG");
        std::fs::write(&path, PNG_MAGIC).unwrap();
        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.file_name, "cv.PNG");
        assert_eq!(upload.media_type, MediaType::Png);
        assert_eq!(upload.len(), PNG_MAGIC.len());
    }
}
