//! Progress-callback trait for per-input conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::EngineConfigBuilder::progress_callback`] to hear about
//! each input as the engine works through a request. A GUI can drive a
//! progress bar or mark list entries done/failed from these events; the CLI
//! feeds an `indicatif` bar.
//!
//! # Example
//!
//! ```rust
//! use imgpdf::{ConversionProgressCallback, EngineConfig};
//! use std::path::PathBuf;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_input_complete(&self, index: usize, total: usize, outputs: &[PathBuf]) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{}: {} file(s)", index + 1, total, outputs.len());
//!     }
//! }
//!
//! let config = EngineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Called by the engine as it processes each input of a request.
///
/// All methods default to no-ops. Implementations must be `Send + Sync`
/// because [`crate::execute_async`] runs the engine on tokio's blocking pool.
///
/// Inputs are numbered by their 0-based position in the request. Events for
/// one request arrive in order on a single thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after validation and before the first input is read.
    fn on_conversion_start(&self, total_inputs: usize) {
        let _ = total_inputs;
    }

    /// Called before an input is decoded.
    fn on_input_start(&self, index: usize, total_inputs: usize, path: &Path) {
        let _ = (index, total_inputs, path);
    }

    /// Called when an input is fully handled.
    ///
    /// `outputs` holds the files produced for it: one image for
    /// ConvertImages, one per page for PdfToImages, and nothing for inputs
    /// merged into a single PDF (that file is reported by the final result).
    fn on_input_complete(&self, index: usize, total_inputs: usize, outputs: &[PathBuf]) {
        let _ = (index, total_inputs, outputs);
    }

    /// Called when an input fails. No further inputs are attempted.
    fn on_input_error(&self, index: usize, total_inputs: usize, error: &str) {
        let _ = (index, total_inputs, error);
    }

    /// Called once at the end, also after a failure.
    ///
    /// `succeeded` counts inputs that reached `on_input_complete`.
    fn on_conversion_complete(&self, total_inputs: usize, succeeded: usize) {
        let _ = (total_inputs, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EngineConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_input_start(&self, _index: usize, _total: usize, _path: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_input_complete(&self, _index: usize, _total: usize, _outputs: &[PathBuf]) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_input_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total: usize, succeeded: usize) {
            self.succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(2);
        cb.on_input_start(0, 2, Path::new("a.png"));
        cb.on_input_complete(0, 2, &[PathBuf::from("out/a.jpg")]);
        cb.on_input_error(1, 2, "decode failed");
        cb.on_conversion_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_input_start(0, 3, Path::new("a.png"));
        tracker.on_input_complete(0, 3, &[]);
        tracker.on_input_start(1, 3, Path::new("b.png"));
        tracker.on_input_error(1, 3, "corrupt");
        tracker.on_conversion_complete(3, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 1);
    }
}
