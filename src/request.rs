//! Conversion requests: what to convert, into what, and where to.
//!
//! A [`ConversionRequest`] is an immutable value. Front ends build one from
//! the user's current selection (or let [`ConversionRequest::infer`] pick
//! the operation) and hand it to [`crate::ConversionEngine::execute`].

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Extensions accepted as image inputs.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "heic"];

/// What an input file holds, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Image,
    Pdf,
}

/// An input path together with its inferred kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    path: PathBuf,
    kind: InputKind,
}

impl InputFile {
    /// Classify `path` by extension (case-insensitive).
    ///
    /// Only `.png .jpg .jpeg .heic .pdf` are accepted. The file is not opened.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let path = path.into();
        let ext = lowercase_extension(&path);
        let kind = match ext.as_deref() {
            Some("pdf") => InputKind::Pdf,
            Some(e) if IMAGE_EXTENSIONS.contains(&e) => InputKind::Image,
            Some(e) => {
                return Err(ConvertError::unsupported(format!(
                    "input extension '.{e}' ({})",
                    path.display()
                )))
            }
            None => {
                return Err(ConvertError::unsupported(format!(
                    "input without extension ({})",
                    path.display()
                )))
            }
        };
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// File name without extension, used to name outputs.
    pub fn stem(&self) -> String {
        file_stem(&self.path)
    }
}

/// Output format of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    Pdf,
    Jpg,
    Png,
    Heic,
}

impl TargetFormat {
    /// Lowercase file extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Pdf => "pdf",
            TargetFormat::Jpg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Heic => "heic",
        }
    }

    /// `true` for the raster formats (everything but PDF).
    pub fn is_image(self) -> bool {
        !matches!(self, TargetFormat::Pdf)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Ok(TargetFormat::Pdf),
            "jpg" | "jpeg" => Ok(TargetFormat::Jpg),
            "png" => Ok(TargetFormat::Png),
            "heic" | "heif" => Ok(TargetFormat::Heic),
            other => Err(ConvertError::unsupported(format!("target format '{other}'"))),
        }
    }
}

/// The four engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Images → one multi-page PDF.
    ImagesToPdf,
    /// Images → one image per input in another format.
    ConvertImages,
    /// PDFs → one image per page.
    PdfToImages,
    /// PDFs → one concatenated PDF.
    MergePdfs,
}

impl Operation {
    /// Kind every input of this operation must have.
    pub fn input_kind(self) -> InputKind {
        match self {
            Operation::ImagesToPdf | Operation::ConvertImages => InputKind::Image,
            Operation::PdfToImages | Operation::MergePdfs => InputKind::Pdf,
        }
    }

    /// `true` when the destination is a single file rather than a directory.
    pub fn writes_single_file(self) -> bool {
        matches!(self, Operation::ImagesToPdf | Operation::MergePdfs)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::ImagesToPdf => "images-to-pdf",
            Operation::ConvertImages => "convert-images",
            Operation::PdfToImages => "pdf-to-images",
            Operation::MergePdfs => "merge-pdfs",
        };
        f.write_str(s)
    }
}

/// An immutable description of one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub inputs: Vec<InputFile>,
    pub operation: Operation,
    pub target_format: TargetFormat,
    /// Output file for ImagesToPdf / MergePdfs, output directory otherwise.
    pub destination: PathBuf,
}

impl ConversionRequest {
    /// Build a request from raw paths, classifying each one.
    pub fn new<P: Into<PathBuf>>(
        paths: impl IntoIterator<Item = P>,
        operation: Operation,
        target_format: TargetFormat,
        destination: impl Into<PathBuf>,
    ) -> Result<Self, ConvertError> {
        let inputs = paths
            .into_iter()
            .map(InputFile::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            inputs,
            operation,
            target_format,
            destination: destination.into(),
        })
    }

    /// Pick the operation from the input kinds and the target format.
    ///
    /// | inputs | target | operation |
    /// |--------|--------|-----------|
    /// | images | PDF    | ImagesToPdf |
    /// | images | image  | ConvertImages |
    /// | PDFs   | PDF    | MergePdfs |
    /// | PDFs   | image  | PdfToImages |
    ///
    /// Mixed or empty inputs are rejected.
    pub fn infer<P: Into<PathBuf>>(
        paths: impl IntoIterator<Item = P>,
        target_format: TargetFormat,
        destination: impl Into<PathBuf>,
    ) -> Result<Self, ConvertError> {
        let inputs = paths
            .into_iter()
            .map(InputFile::from_path)
            .collect::<Result<Vec<_>, _>>()?;

        let first = inputs
            .first()
            .ok_or_else(|| ConvertError::Validation("no input files".into()))?
            .kind();
        if inputs.iter().any(|i| i.kind() != first) {
            return Err(ConvertError::Validation(
                "inputs mix images and PDFs; convert them separately".into(),
            ));
        }

        let operation = match (first, target_format.is_image()) {
            (InputKind::Image, false) => Operation::ImagesToPdf,
            (InputKind::Image, true) => Operation::ConvertImages,
            (InputKind::Pdf, false) => Operation::MergePdfs,
            (InputKind::Pdf, true) => Operation::PdfToImages,
        };

        Ok(Self {
            inputs,
            operation,
            target_format,
            destination: destination.into(),
        })
    }

    /// Check every request invariant. Performs no I/O.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.inputs.is_empty() {
            return Err(ConvertError::Validation("no input files".into()));
        }

        let wanted = self.operation.input_kind();
        if let Some(bad) = self.inputs.iter().find(|i| i.kind() != wanted) {
            return Err(ConvertError::Validation(format!(
                "{} expects {:?} inputs, got '{}'",
                self.operation,
                wanted,
                bad.path().display()
            )));
        }

        if self.operation.writes_single_file() == self.target_format.is_image() {
            return Err(ConvertError::unsupported(format!(
                "{} cannot produce {}",
                self.operation, self.target_format
            )));
        }

        if self.operation == Operation::MergePdfs && self.inputs.len() < 2 {
            return Err(ConvertError::Validation(format!(
                "merging needs at least two PDFs, got {}",
                self.inputs.len()
            )));
        }

        if self.destination.as_os_str().is_empty() {
            return Err(ConvertError::Validation("destination is empty".into()));
        }

        Ok(())
    }
}

/// Append `.pdf` unless `name` already ends with it (case-insensitive).
pub fn ensure_pdf_extension(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.to_lowercase().ends_with(".pdf") {
        trimmed.to_string()
    } else {
        format!("{trimmed}.pdf")
    }
}

pub(crate) fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert_eq!(
            InputFile::from_path("a/B.PNG").unwrap().kind(),
            InputKind::Image
        );
        assert_eq!(
            InputFile::from_path("photo.Jpeg").unwrap().kind(),
            InputKind::Image
        );
        assert_eq!(
            InputFile::from_path("IMG_0001.heic").unwrap().kind(),
            InputKind::Image
        );
        assert_eq!(
            InputFile::from_path("report.Pdf").unwrap().kind(),
            InputKind::Pdf
        );
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        let e = InputFile::from_path("anim.gif").unwrap_err();
        assert!(matches!(e, ConvertError::UnsupportedFormat { .. }));
        assert!(e.to_string().contains(".gif"));
        assert!(InputFile::from_path("README").is_err());
    }

    #[test]
    fn stem_drops_directory_and_extension() {
        let f = InputFile::from_path("/tmp/scans/page one.jpg").unwrap();
        assert_eq!(f.stem(), "page one");
    }

    #[test]
    fn target_format_parsing() {
        assert_eq!("PDF".parse::<TargetFormat>().unwrap(), TargetFormat::Pdf);
        assert_eq!("jpeg".parse::<TargetFormat>().unwrap(), TargetFormat::Jpg);
        assert_eq!(".png".parse::<TargetFormat>().unwrap(), TargetFormat::Png);
        assert_eq!("HEIF".parse::<TargetFormat>().unwrap(), TargetFormat::Heic);
        assert!("tiff".parse::<TargetFormat>().is_err());
        assert_eq!(TargetFormat::Jpg.to_string(), "JPG");
    }

    #[test]
    fn infer_matches_the_selection_table() {
        let r = ConversionRequest::infer(["a.png", "b.jpg"], TargetFormat::Pdf, "out.pdf").unwrap();
        assert_eq!(r.operation, Operation::ImagesToPdf);

        let r = ConversionRequest::infer(["a.png"], TargetFormat::Jpg, "out").unwrap();
        assert_eq!(r.operation, Operation::ConvertImages);

        let r = ConversionRequest::infer(["a.pdf", "b.pdf"], TargetFormat::Pdf, "m.pdf").unwrap();
        assert_eq!(r.operation, Operation::MergePdfs);

        let r = ConversionRequest::infer(["a.pdf"], TargetFormat::Png, "pages").unwrap();
        assert_eq!(r.operation, Operation::PdfToImages);
    }

    #[test]
    fn infer_rejects_mixed_and_empty_inputs() {
        let e = ConversionRequest::infer(["a.png", "b.pdf"], TargetFormat::Pdf, "o.pdf").unwrap_err();
        assert!(matches!(e, ConvertError::Validation(_)));

        let none: [&str; 0] = [];
        let e = ConversionRequest::infer(none, TargetFormat::Pdf, "o.pdf").unwrap_err();
        assert!(matches!(e, ConvertError::Validation(_)));
    }

    #[test]
    fn validate_enforces_kinds_and_targets() {
        let r = ConversionRequest::new(["a.pdf"], Operation::ImagesToPdf, TargetFormat::Pdf, "o.pdf")
            .unwrap();
        assert!(matches!(r.validate(), Err(ConvertError::Validation(_))));

        let r = ConversionRequest::new(["a.png"], Operation::ConvertImages, TargetFormat::Pdf, "o")
            .unwrap();
        assert!(matches!(
            r.validate(),
            Err(ConvertError::UnsupportedFormat { .. })
        ));

        let r = ConversionRequest::new(["a.pdf", "b.pdf"], Operation::MergePdfs, TargetFormat::Png, "o")
            .unwrap();
        assert!(matches!(
            r.validate(),
            Err(ConvertError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn merge_needs_two_inputs() {
        let r = ConversionRequest::new(["only.pdf"], Operation::MergePdfs, TargetFormat::Pdf, "m.pdf")
            .unwrap();
        let e = r.validate().unwrap_err();
        assert!(e.to_string().contains("at least two"), "got: {e}");
    }

    #[test]
    fn pdf_extension_helper() {
        assert_eq!(ensure_pdf_extension("report"), "report.pdf");
        assert_eq!(ensure_pdf_extension("report.PDF"), "report.PDF");
        assert_eq!(ensure_pdf_extension(" scans.pdf "), "scans.pdf");
    }
}
