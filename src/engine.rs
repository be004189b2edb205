//! The conversion engine.
//!
//! [`ConversionEngine`] holds nothing but an immutable [`EngineConfig`].
//! Every call validates its request, does the work, and returns; nothing is
//! remembered between calls.
//!
//! ## Failure model
//!
//! Operations are all-or-nothing and stop at the first failing input:
//!
//! - ImagesToPdf decodes every image before pdfium is touched, and
//!   MergePdfs collects pages in memory; both write their single output
//!   atomically, so a failure leaves no PDF behind.
//! - ConvertImages and PdfToImages write one file at a time. Files written
//!   before the failure stay on disk.

use crate::config::EngineConfig;
use crate::error::ConvertError;
use crate::output::{Artifacts, ConversionResult, DocumentInfo, InputReport};
use crate::pipeline::{decode, encode, pdf, write};
use crate::progress::ProgressCallback;
use crate::request::{ConversionRequest, InputFile, Operation, TargetFormat};
use pdfium_render::prelude::Pdfium;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Converts between images and PDFs according to one [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConversionEngine {
    config: EngineConfig,
}

impl ConversionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate `request` and run the operation it names.
    pub fn execute(&self, request: &ConversionRequest) -> Result<ConversionResult, ConvertError> {
        self.config.validate()?;
        request.validate()?;

        let start = Instant::now();
        info!(
            "Starting {}: {} input(s) → {} at {}",
            request.operation,
            request.inputs.len(),
            request.target_format,
            request.destination.display()
        );

        let mut tracker = Tracker::new(self.config.progress_callback.as_ref(), request.inputs.len());
        let outcome = match request.operation {
            Operation::ImagesToPdf => self.run_images_to_pdf(request, &mut tracker),
            Operation::ConvertImages => self.run_convert_images(request, &mut tracker),
            Operation::PdfToImages => self.run_pdf_to_images(request, &mut tracker),
            Operation::MergePdfs => self.run_merge_pdfs(request, &mut tracker),
        };
        tracker.finish();

        let (artifacts, inputs) = outcome?;
        let result = ConversionResult {
            operation: request.operation,
            target_format: request.target_format,
            artifacts,
            inputs,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "{} complete: {} file(s), {} page(s), {}ms",
            result.operation,
            result.artifacts.len(),
            result.total_pages(),
            result.duration_ms
        );
        Ok(result)
    }

    /// Decode every image and write them as one PDF, one page each, in order.
    pub fn images_to_pdf<P: AsRef<Path>>(
        &self,
        paths: &[P],
        output_path: impl AsRef<Path>,
    ) -> Result<ConversionResult, ConvertError> {
        self.execute(&request(
            paths,
            Operation::ImagesToPdf,
            TargetFormat::Pdf,
            output_path,
        )?)
    }

    /// Re-encode each image as `format` into `output_dir/<basename>.<ext>`.
    pub fn convert_images<P: AsRef<Path>>(
        &self,
        paths: &[P],
        output_dir: impl AsRef<Path>,
        format: TargetFormat,
    ) -> Result<ConversionResult, ConvertError> {
        self.execute(&request(paths, Operation::ConvertImages, format, output_dir)?)
    }

    /// Rasterise the pages of one PDF into `output_dir/<pdfbase>_page_<n>.<ext>`.
    pub fn pdf_to_images(
        &self,
        pdf_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        format: TargetFormat,
    ) -> Result<ConversionResult, ConvertError> {
        self.execute(&request(
            &[pdf_path],
            Operation::PdfToImages,
            format,
            output_dir,
        )?)
    }

    /// Concatenate two or more PDFs, in order, into `output_path`.
    pub fn merge_pdfs<P: AsRef<Path>>(
        &self,
        paths: &[P],
        output_path: impl AsRef<Path>,
    ) -> Result<ConversionResult, ConvertError> {
        self.execute(&request(
            paths,
            Operation::MergePdfs,
            TargetFormat::Pdf,
            output_path,
        )?)
    }

    /// Read page count, version and Info-dictionary strings of a PDF.
    pub fn inspect(&self, pdf_path: impl AsRef<Path>) -> Result<DocumentInfo, ConvertError> {
        let pdf_path = pdf_path.as_ref();
        self.config.validate()?;
        let pdfium = self.bind()?;
        let info = pdf::read_info(&pdfium, pdf_path)?;
        debug!(
            "Inspected {}: {} pages, {}",
            pdf_path.display(),
            info.page_count,
            info.pdf_version
        );
        Ok(info)
    }

    // ── Operations ───────────────────────────────────────────────────────

    fn run_images_to_pdf(
        &self,
        request: &ConversionRequest,
        tracker: &mut Tracker<'_>,
    ) -> Result<(Artifacts, Vec<InputReport>), ConvertError> {
        let dest = request.destination.as_path();

        let mut images = Vec::with_capacity(request.inputs.len());
        let mut reports = Vec::with_capacity(request.inputs.len());
        for (idx, input) in request.inputs.iter().enumerate() {
            let image = tracker.attempt(idx, input.path(), || decode::decode_image(input.path()))?;
            images.push(image);
            reports.push(InputReport {
                input: input.path().to_path_buf(),
                outputs: vec![],
                pages: 1,
            });
        }

        let pdfium = self.bind()?;
        let bytes = pdf::build_from_images(&pdfium, &images, dest)?;
        write::write_atomic(dest, &bytes)?;
        tracker.complete_all();

        Ok((Artifacts::Single(dest.to_path_buf()), reports))
    }

    fn run_convert_images(
        &self,
        request: &ConversionRequest,
        tracker: &mut Tracker<'_>,
    ) -> Result<(Artifacts, Vec<InputReport>), ConvertError> {
        let format = request.target_format;
        let output_dir = request.destination.as_path();
        write::ensure_dir(output_dir)?;

        let mut written = Vec::with_capacity(request.inputs.len());
        let mut seen = HashSet::new();
        let mut reports = Vec::with_capacity(request.inputs.len());

        for (idx, input) in request.inputs.iter().enumerate() {
            let out_path = output_dir.join(format!("{}.{}", input.stem(), format.extension()));
            if !seen.insert(out_path.clone()) {
                warn!(
                    "{} maps to {} which an earlier input already wrote; overwriting",
                    input.path().display(),
                    out_path.display()
                );
            }

            tracker.attempt(idx, input.path(), || {
                let image = decode::decode_image(input.path())?;
                let bytes =
                    encode::encode_image(&image, format, self.config.jpeg_quality, &out_path)?;
                write::write_file(&out_path, &bytes)
            })?;
            tracker.complete(idx, std::slice::from_ref(&out_path));

            written.push(out_path.clone());
            reports.push(InputReport {
                input: input.path().to_path_buf(),
                outputs: vec![out_path],
                pages: 1,
            });
        }

        Ok((Artifacts::Many(written), reports))
    }

    fn run_pdf_to_images(
        &self,
        request: &ConversionRequest,
        tracker: &mut Tracker<'_>,
    ) -> Result<(Artifacts, Vec<InputReport>), ConvertError> {
        let pdfium = self.bind()?;
        let mut written = Vec::new();
        let mut seen = HashSet::new();
        let mut reports = Vec::with_capacity(request.inputs.len());

        for (idx, input) in request.inputs.iter().enumerate() {
            let outputs = tracker.attempt(idx, input.path(), || {
                self.rasterise_one(&pdfium, input, request.target_format, &request.destination)
            })?;
            tracker.complete(idx, &outputs);

            for out_path in &outputs {
                if seen.insert(out_path.clone()) {
                    written.push(out_path.clone());
                } else {
                    warn!(
                        "{} overwrote {} from an earlier input with the same name",
                        input.path().display(),
                        out_path.display()
                    );
                }
            }
            reports.push(InputReport {
                input: input.path().to_path_buf(),
                pages: outputs.len(),
                outputs,
            });
        }

        Ok((Artifacts::Many(written), reports))
    }

    fn rasterise_one(
        &self,
        pdfium: &Pdfium,
        input: &InputFile,
        format: TargetFormat,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ConvertError> {
        let base = input.stem();
        let folder = if self.config.page_subfolder {
            output_dir.join(&base)
        } else {
            output_dir.to_path_buf()
        };
        write::ensure_dir(&folder)?;

        let mut outputs = Vec::new();
        pdf::render_pages(pdfium, input.path(), &self.config, |page, image| {
            let out_path = folder.join(page_file_name(&base, page, format));
            let bytes = encode::encode_image(&image, format, self.config.jpeg_quality, &out_path)?;
            write::write_file(&out_path, &bytes)?;
            outputs.push(out_path);
            Ok(())
        })?;

        info!(
            "Rasterised {} → {} page image(s) in {}",
            input.path().display(),
            outputs.len(),
            folder.display()
        );
        Ok(outputs)
    }

    fn run_merge_pdfs(
        &self,
        request: &ConversionRequest,
        tracker: &mut Tracker<'_>,
    ) -> Result<(Artifacts, Vec<InputReport>), ConvertError> {
        let dest = request.destination.as_path();
        let pdfium = self.bind()?;
        let mut merger = pdf::Merger::new(&pdfium, dest)?;
        let mut reports = Vec::with_capacity(request.inputs.len());

        for (idx, input) in request.inputs.iter().enumerate() {
            let pages = tracker.attempt(idx, input.path(), || merger.append(input.path()))?;
            reports.push(InputReport {
                input: input.path().to_path_buf(),
                outputs: vec![],
                pages,
            });
        }

        let bytes = merger.finish()?;
        write::write_atomic(dest, &bytes)?;
        tracker.complete_all();

        Ok((Artifacts::Single(dest.to_path_buf()), reports))
    }

    fn bind(&self) -> Result<Pdfium, ConvertError> {
        let pdfium = pdf::bind(&self.config.pdfium)?;
        debug!("pdfium bound ({:?})", self.config.pdfium);
        Ok(pdfium)
    }
}

/// `<base>_page_<n>.<ext>`, with `n` 1-based.
pub fn page_file_name(base: &str, page: usize, format: TargetFormat) -> String {
    format!("{base}_page_{page}.{}", format.extension())
}

fn request<P: AsRef<Path>>(
    paths: &[P],
    operation: Operation,
    format: TargetFormat,
    destination: impl AsRef<Path>,
) -> Result<ConversionRequest, ConvertError> {
    ConversionRequest::new(
        paths.iter().map(|p| p.as_ref().to_path_buf()),
        operation,
        format,
        destination.as_ref(),
    )
}

/// Forwards per-input events to the optional progress callback.
struct Tracker<'a> {
    callback: Option<&'a ProgressCallback>,
    total: usize,
    succeeded: usize,
}

impl<'a> Tracker<'a> {
    fn new(callback: Option<&'a ProgressCallback>, total: usize) -> Self {
        if let Some(cb) = callback {
            cb.on_conversion_start(total);
        }
        Self {
            callback,
            total,
            succeeded: 0,
        }
    }

    /// Announce input `index`, run `work`, and report its error if it fails.
    fn attempt<T>(
        &mut self,
        index: usize,
        path: &Path,
        work: impl FnOnce() -> Result<T, ConvertError>,
    ) -> Result<T, ConvertError> {
        if let Some(cb) = self.callback {
            cb.on_input_start(index, self.total, path);
        }
        work().map_err(|e| {
            warn!("Input {} ({}) failed: {}", index + 1, path.display(), e);
            if let Some(cb) = self.callback {
                cb.on_input_error(index, self.total, &e.to_string());
            }
            e
        })
    }

    fn complete(&mut self, index: usize, outputs: &[PathBuf]) {
        self.succeeded += 1;
        if let Some(cb) = self.callback {
            cb.on_input_complete(index, self.total, outputs);
        }
    }

    /// Report every input complete at once, for operations whose single
    /// output only exists after the last input is processed.
    fn complete_all(&mut self) {
        for index in 0..self.total {
            self.complete(index, &[]);
        }
    }

    fn finish(&self) {
        if let Some(cb) = self.callback {
            cb.on_conversion_complete(self.total, self.succeeded);
        }
    }
}
