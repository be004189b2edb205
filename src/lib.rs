//! # imgpdf
//!
//! Convert between raster images and PDF documents.
//!
//! Four operations cover the whole surface:
//!
//! | Operation | Inputs | Output |
//! |-----------|--------|--------|
//! | ImagesToPdf | PNG / JPEG / HEIC | one PDF, one page per image, in order |
//! | ConvertImages | PNG / JPEG / HEIC | one image per input, `<basename>.<ext>` |
//! | PdfToImages | PDF | one image per page, `<pdfbase>_page_<n>.<ext>` |
//! | MergePdfs | ≥ 2 PDFs | one PDF, pages concatenated in input order |
//!
//! Raster codecs come from the `image` crate, everything PDF from pdfium
//! through `pdfium-render`, and HEIC from libheif behind the `heic` feature.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ConversionRequest
//!  │
//!  ├─ 1. Validate  input kinds, target format, merge arity
//!  ├─ 2. Input     existence, permissions, %PDF magic
//!  ├─ 3. Decode    image → RGB8, or pdfium page → RGB8
//!  ├─ 4. Encode    PNG / JPEG / HEIC, or pdfium document bytes
//!  └─ 5. Write     per-file outputs, atomic single-PDF outputs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgpdf::{ConversionEngine, EngineConfig, TargetFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = ConversionEngine::new(EngineConfig::default());
//!
//!     let pdf = engine.images_to_pdf(&["a.png", "b.jpg"], "out.pdf")?;
//!     eprintln!("{} pages", pdf.total_pages());
//!
//!     let pages = engine.pdf_to_images("out.pdf", "pages", TargetFormat::Png)?;
//!     for path in pages.artifacts.paths() {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! A front end that only knows "these files, this format, put it there" can
//! let the request pick the operation:
//!
//! ```rust,no_run
//! use imgpdf::{ConversionEngine, ConversionRequest, EngineConfig, TargetFormat};
//!
//! # fn main() -> Result<(), imgpdf::ConvertError> {
//! let request = ConversionRequest::infer(["one.pdf", "two.pdf"], TargetFormat::Pdf, "both.pdf")?;
//! ConversionEngine::new(EngineConfig::default()).execute(&request)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imgpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `heic`  | off     | HEIC decode/encode through libheif (needs the system library) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! imgpdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! PDF operations need the pdfium shared library. By default it is taken
//! from `PDFIUM_LIB_PATH`, then from the per-user cache, and downloaded into
//! that cache on first use. See [`PdfiumSource`] for the alternatives.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod asynchronous;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::{zip_outputs, zip_path_for};
pub use asynchronous::{execute_async, inspect_async};
pub use config::{EngineConfig, EngineConfigBuilder, PageSelection, PdfiumSource};
pub use engine::ConversionEngine;
pub use error::{ConvertError, ErrorKind};
pub use output::{Artifacts, ConversionResult, DocumentInfo, InputReport};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{
    ensure_pdf_extension, ConversionRequest, InputFile, InputKind, Operation, TargetFormat,
};
