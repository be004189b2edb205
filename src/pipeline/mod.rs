//! Conversion stages.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the engine reads as a sequence of calls.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌──────────▶ encode ──▶ write   (ConvertImages)
//! input ──▶ decode
//!            └──────────▶ pdf::build ──▶ write   (ImagesToPdf)
//!
//! input ──▶ pdf::merge ──▶ write             (MergePdfs)
//! input ──▶ pdf::render ──▶ encode ──▶ write (PdfToImages)
//! ```
//!
//! 1. [`input`]: existence, permission and `%PDF` magic checks
//! 2. [`decode`]: open an image file and normalise it to RGB8
//! 3. [`encode`]: RGB image → PNG / JPEG / HEIC bytes
//! 4. [`heic`]: libheif bridge, compiled only with the `heic` feature
//! 5. [`pdf`]: every pdfium call: bind, build, merge, render, inspect
//! 6. [`write`]: output directories and atomic file writes

pub mod decode;
pub mod encode;
pub mod heic;
pub mod input;
pub mod pdf;
pub mod write;
