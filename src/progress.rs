//! Progress-callback trait for ingestion and chat events.
//!
//! Inject an [`Arc<dyn ReviewProgressCallback>`] via
//! [`crate::config::ReviewConfigBuilder::progress_callback`] to be told when
//! a remote call starts and how it ended. Both remote calls can take tens of
//! seconds, so a front end usually shows a spinner between the start and
//! complete/error events.
//!
//! # Example
//!
//! ```rust
//! use cv_review::{ReviewConfig, ReviewProgressCallback};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl ReviewProgressCallback for Logger {
//!     fn on_ingest_complete(&self, pages: usize, text_len: usize) {
//!         eprintln!("OCR read {pages} page(s), {text_len} chars");
//!     }
//! }
//!
//! let config = ReviewConfig::builder()
//!     .api_key("sk-test")
//!     .progress_callback(Arc::new(Logger) as Arc<dyn ReviewProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Events emitted by [`crate::assistant::CvAssistant`] around each remote call.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ReviewProgressCallback: Send + Sync {
    /// Called before the upload is sent to the OCR endpoint.
    ///
    /// # Arguments
    /// * `file_name` — name of the uploaded file
    /// * `size`      — upload size in bytes
    fn on_ingest_start(&self, file_name: &str, size: usize) {
        let _ = (file_name, size);
    }

    /// Called when OCR produced text.
    ///
    /// # Arguments
    /// * `pages`    — pages that carried text
    /// * `text_len` — byte length of the joined text
    fn on_ingest_complete(&self, pages: usize, text_len: usize) {
        let _ = (pages, text_len);
    }

    /// Called when ingestion failed for any reason.
    fn on_ingest_error(&self, error: &str) {
        let _ = error;
    }

    /// Called before a transcript is sent to the chat model.
    ///
    /// # Arguments
    /// * `turns` — number of messages in the outgoing request
    fn on_reply_start(&self, turns: usize) {
        let _ = turns;
    }

    /// Called when the model answered.
    fn on_reply_complete(&self, reply_len: usize) {
        let _ = reply_len;
    }

    /// Called when the chat call failed.
    fn on_reply_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReviewProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReviewConfig`].
pub type ProgressCallback = Arc<dyn ReviewProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        ingests: AtomicUsize,
        replies: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ReviewProgressCallback for TrackingCallback {
        fn on_ingest_complete(&self, _pages: usize, _text_len: usize) {
            self.ingests.fetch_add(1, Ordering::SeqCst);
        }

        fn on_reply_complete(&self, _reply_len: usize) {
            self.replies.fetch_add(1, Ordering::SeqCst);
        }

        fn on_ingest_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_reply_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_ingest_start("cv.pdf", 1024);
        cb.on_ingest_complete(2, 300);
        cb.on_ingest_error("boom");
        cb.on_reply_start(4);
        cb.on_reply_complete(120);
        cb.on_reply_error("timeout");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_ingest_start("cv.png", 10);
        tracker.on_ingest_complete(1, 10);
        tracker.on_reply_start(4);
        tracker.on_reply_complete(50);
        tracker.on_reply_start(6);
        tracker.on_reply_error("rate limited");

        assert_eq!(tracker.ingests.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.replies.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_reply_start(2);
        cb.on_reply_complete(512);
    }
}
