//! Async entry points for callers already running on tokio.
//!
//! The engine is synchronous and pdfium calls are CPU-bound, so running them
//! on a tokio worker would stall every other task on that worker. These
//! wrappers move the work onto tokio's blocking pool with
//! `tokio::task::spawn_blocking`.

use crate::config::EngineConfig;
use crate::engine::ConversionEngine;
use crate::error::ConvertError;
use crate::output::{ConversionResult, DocumentInfo};
use crate::request::ConversionRequest;
use std::path::PathBuf;

/// Run [`ConversionEngine::execute`] on the blocking pool.
pub async fn execute_async(
    config: EngineConfig,
    request: ConversionRequest,
) -> Result<ConversionResult, ConvertError> {
    tokio::task::spawn_blocking(move || ConversionEngine::new(config).execute(&request))
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Run [`ConversionEngine::inspect`] on the blocking pool.
pub async fn inspect_async(
    config: EngineConfig,
    pdf_path: impl Into<PathBuf>,
) -> Result<DocumentInfo, ConvertError> {
    let pdf_path = pdf_path.into();
    tokio::task::spawn_blocking(move || ConversionEngine::new(config).inspect(&pdf_path))
        .await
        .map_err(|e| ConvertError::Internal(format!("Inspect task panicked: {}", e)))?
}
