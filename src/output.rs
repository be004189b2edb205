//! Result types returned by the engine.

use crate::request::{Operation, TargetFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The files a conversion produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Artifacts {
    /// One merged artifact (ImagesToPdf, MergePdfs).
    Single(PathBuf),
    /// One file per input or per page, in input / page order.
    Many(Vec<PathBuf>),
}

impl Artifacts {
    /// All produced paths, in order.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Artifacts::Single(p) => vec![p.as_path()],
            Artifacts::Many(ps) => ps.iter().map(PathBuf::as_path).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Artifacts::Single(_) => 1,
            Artifacts::Many(ps) => ps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to one input of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputReport {
    pub input: PathBuf,
    /// Files written for this input. Empty for inputs folded into a single
    /// PDF; that file is [`ConversionResult::artifacts`].
    pub outputs: Vec<PathBuf>,
    /// Pages this input contributed (images always contribute one).
    pub pages: usize,
}

/// Successful outcome of one engine call.
///
/// Operations are all-or-nothing: when this value exists, every input in
/// `inputs` converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub operation: Operation,
    pub target_format: TargetFormat,
    pub artifacts: Artifacts,
    /// One entry per input, in request order.
    pub inputs: Vec<InputReport>,
    pub duration_ms: u64,
}

impl ConversionResult {
    /// Total pages across all inputs.
    pub fn total_pages(&self) -> usize {
        self.inputs.iter().map(|r| r.pages).sum()
    }
}

/// Document information read from a PDF without rendering it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_paths_keep_order() {
        let many = Artifacts::Many(vec!["x_page_1.png".into(), "x_page_2.png".into()]);
        assert_eq!(many.len(), 2);
        assert_eq!(many.paths()[1], Path::new("x_page_2.png"));
        assert!(!Artifacts::Single("out.pdf".into()).is_empty());
        assert!(Artifacts::Many(vec![]).is_empty());
    }

    #[test]
    fn result_serialises_to_json() {
        let result = ConversionResult {
            operation: Operation::ImagesToPdf,
            target_format: TargetFormat::Pdf,
            artifacts: Artifacts::Single("out.pdf".into()),
            inputs: vec![
                InputReport {
                    input: "a.png".into(),
                    outputs: vec![],
                    pages: 1,
                },
                InputReport {
                    input: "b.jpg".into(),
                    outputs: vec![],
                    pages: 1,
                },
            ],
            duration_ms: 12,
        };
        assert_eq!(result.total_pages(), 2);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["operation"], "ImagesToPdf");
        assert_eq!(json["artifacts"]["Single"], "out.pdf");
    }
}
