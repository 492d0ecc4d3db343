//! Pipeline stages between an uploaded file and a chat reply.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ─────▶ llm
//! (file)    (data URL)  (pages)    (reply)
//! ```
//!
//! 1. [`input`]  — validate extension and magic bytes, load the upload
//! 2. [`encode`] — base64 the bytes into a `data:` URL descriptor
//! 3. [`ocr`]    — call the OCR endpoint and join per-page text
//! 4. [`llm`]    — send the transcript to the chat model
//!
//! `ocr` and `llm` are the only stages with network I/O; each sits behind a
//! trait so the session logic can be driven by scripted clients in tests.

pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
