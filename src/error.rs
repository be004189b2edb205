//! Error types for the imgpdf library.
//!
//! Every engine operation is all-or-nothing, so there is a single fatal
//! error type, [`ConvertError`]. Variants carry the path of the input or
//! output that failed so a caller can point the user at the offending file.
//!
//! Callers that only care about the broad failure class can use
//! [`ConvertError::kind`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the imgpdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The image could not be opened or decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    Decode { path: PathBuf, detail: String },

    /// The file has a `.pdf` extension but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not parse the document.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The PDF is encrypted.
    #[error("PDF '{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    // ── Format errors ─────────────────────────────────────────────────────
    /// Unknown input extension or a target format the operation cannot produce.
    #[error("Unsupported format: {what}")]
    UnsupportedFormat { what: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// An encoder rejected the image (includes a missing HEIC codec).
    #[error("Failed to encode '{path}': {detail}")]
    Encode { path: PathBuf, detail: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page} of '{path}': {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// Could not create or write an output file or directory.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Request / config errors ───────────────────────────────────────────
    /// The request is malformed (empty input list, wrong input kinds,
    /// fewer than two PDFs to merge, empty page selection).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Environment ───────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy, or allow\n\
the automatic download of the platform build."
    )]
    PdfiumBindingFailed(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Unreadable or corrupt input.
    Decode,
    /// Unknown extension or target format.
    UnsupportedFormat,
    /// Encoder or write failure.
    Encode,
    /// Malformed request or configuration.
    Validation,
    /// pdfium unavailable or an internal failure.
    Environment,
}

impl ConvertError {
    /// Map the variant onto its failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::FileNotFound { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::Decode { .. }
            | ConvertError::NotAPdf { .. }
            | ConvertError::CorruptPdf { .. }
            | ConvertError::PasswordRequired { .. } => ErrorKind::Decode,
            ConvertError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ConvertError::Encode { .. }
            | ConvertError::RasterisationFailed { .. }
            | ConvertError::OutputWriteFailed { .. } => ErrorKind::Encode,
            ConvertError::Validation(_) | ConvertError::InvalidConfig(_) => ErrorKind::Validation,
            ConvertError::PdfiumBindingFailed(_) | ConvertError::Internal(_) => {
                ErrorKind::Environment
            }
        }
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        ConvertError::UnsupportedFormat { what: what.into() }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display_names_the_file() {
        let e = ConvertError::Decode {
            path: "scans/a.png".into(),
            detail: "truncated".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("scans/a.png"), "got: {msg}");
        assert!(msg.contains("truncated"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Decode);
    }

    #[test]
    fn rasterisation_failure_is_an_encode_error() {
        let e = ConvertError::RasterisationFailed {
            path: "doc.pdf".into(),
            page: 3,
            detail: "oom".into(),
        };
        assert!(e.to_string().contains("page 3"));
        assert_eq!(e.kind(), ErrorKind::Encode);
    }

    #[test]
    fn kinds_cover_request_and_environment_errors() {
        assert_eq!(
            ConvertError::Validation("need two PDFs".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ConvertError::unsupported("target 'gif'").kind(),
            ErrorKind::UnsupportedFormat
        );
        assert_eq!(
            ConvertError::PdfiumBindingFailed("no lib".into()).kind(),
            ErrorKind::Environment
        );
    }

    #[test]
    fn write_failure_keeps_io_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let e = ConvertError::write_failed("/out/x.pdf", io);
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/out/x.pdf"));
    }
}
