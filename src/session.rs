//! Session state: OCR result plus transcript, and the phase derived from them.
//!
//! ```text
//!  Uploading ──ingest──▶ Ingesting ──ok──▶ Chatting
//!      ▲                     │                │
//!      └──────── error ──────┘                │
//!      └───────────────── reset ──────────────┘
//! ```
//!
//! A session only moves forward; the single way back is [`Session::reset`],
//! which drops everything, OCR text included.

use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// Phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No document yet; only an upload is accepted.
    Uploading,
    /// OCR call in flight.
    Ingesting,
    /// OCR text available; the conversation drives the session.
    Chatting,
}

/// Everything one review session knows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    ocr_done: bool,
    ocr_text: String,
    transcript: Transcript,
    #[serde(skip)]
    ingesting: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.ocr_done {
            SessionState::Chatting
        } else if self.ingesting {
            SessionState::Ingesting
        } else {
            SessionState::Uploading
        }
    }

    pub fn ocr_done(&self) -> bool {
        self.ocr_done
    }

    pub fn ocr_text(&self) -> &str {
        &self.ocr_text
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    /// Enter `Ingesting` until the returned guard is completed or dropped.
    ///
    /// Dropping the guard (an error, or a cancelled OCR call) puts the session
    /// back in `Uploading`.
    pub(crate) fn begin_ingest(&mut self) -> IngestGuard<'_> {
        self.ingesting = true;
        IngestGuard { session: self }
    }

    pub(crate) fn open_transcript(&mut self, transcript: Transcript) {
        self.transcript = transcript;
    }

    /// Discard all session data and return to `Uploading`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// In-flight ingestion; see [`Session::begin_ingest`].
pub(crate) struct IngestGuard<'a> {
    session: &'a mut Session,
}

impl IngestGuard<'_> {
    /// Record the OCR text and move the session to `Chatting`.
    pub(crate) fn complete(mut self, text: String) {
        self.session.ocr_text = text;
        self.session.ocr_done = true;
    }
}

impl std::ops::Deref for IngestGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        &*self.session
    }
}

impl Drop for IngestGuard<'_> {
    fn drop(&mut self) {
        self.session.ingesting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_uploading() {
        let s = Session::new();
        assert_eq!(s.state(), SessionState::Uploading);
        assert!(!s.ocr_done());
        assert!(s.ocr_text().is_empty());
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn ingest_lifecycle() {
        let mut s = Session::new();
        let guard = s.begin_ingest();
        assert_eq!(guard.state(), SessionState::Ingesting);
        drop(guard);
        assert_eq!(s.state(), SessionState::Uploading);

        s.begin_ingest().complete("Name: A".into());
        assert_eq!(s.state(), SessionState::Chatting);
        assert_eq!(s.ocr_text(), "Name: A");
    }

    #[test]
    fn reset_discards_everything() {
        let mut s = Session::new();
        s.begin_ingest().complete("text".into());
        s.open_transcript(Transcript::opened("sys", "hi"));
        s.reset();
        assert_eq!(s.state(), SessionState::Uploading);
        assert!(!s.ocr_done());
        assert_eq!(s.ocr_text(), "");
        assert!(s.transcript().is_empty());
    }
}
