//! Every pdfium call the engine makes: binding, building a PDF from images,
//! merging, rasterising pages and reading document information.
//!
//! ## Why bytes, not files?
//!
//! Building and merging end in `save_to_bytes`. The engine then writes the
//! bytes atomically through [`crate::pipeline::write`], so a failure inside
//! pdfium never leaves a truncated PDF at the destination.
//!
//! ## Page geometry
//!
//! An image becomes a page of exactly its pixel size in points (1 px = 1 pt,
//! i.e. 72 DPI) with the image stretched over the whole page. Rendering at
//! the default 72 DPI therefore gives back the original pixel dimensions.

use crate::config::{EngineConfig, PdfiumSource};
use crate::error::ConvertError;
use crate::output::DocumentInfo;
use crate::pipeline::{decode, input};
use image::DynamicImage;
use pdfium_auto::Resolve;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bind to pdfium according to `source`.
///
/// Never reports download progress; callers that want a progress bar resolve
/// the library with [`pdfium_auto::resolve_library`] first and pass
/// [`PdfiumSource::Library`].
pub fn bind(source: &PdfiumSource) -> Result<Pdfium, ConvertError> {
    let bound = match source {
        PdfiumSource::Auto { allow_download } => {
            let mode = if *allow_download {
                Resolve::AllowDownload
            } else {
                Resolve::LocalOnly
            };
            pdfium_auto::bind_pdfium(None, mode, None)
        }
        PdfiumSource::Library(path) => pdfium_auto::bind_pdfium_from_path(path),
        PdfiumSource::System => pdfium_auto::bind_system_library(),
    };
    bound.map_err(|e| ConvertError::PdfiumBindingFailed(e.to_string()))
}

/// Open an existing PDF after checking its magic bytes.
pub fn open<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, ConvertError> {
    input::check_pdf(path)?;

    pdfium.load_pdf_from_file(path, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            ConvertError::PasswordRequired {
                path: path.to_path_buf(),
            }
        } else {
            ConvertError::CorruptPdf {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Build a PDF with one page per image, in order, and return its bytes.
///
/// `dest` labels errors only.
pub fn build_from_images(
    pdfium: &Pdfium,
    images: &[DynamicImage],
    dest: &Path,
) -> Result<Vec<u8>, ConvertError> {
    let encode_err = |what: &str, e: PdfiumError| ConvertError::Encode {
        path: dest.to_path_buf(),
        detail: format!("{what}: {:?}", e),
    };

    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| encode_err("create document", e))?;

    for (idx, image) in images.iter().enumerate() {
        let width = PdfPoints::new(image.width() as f32);
        let height = PdfPoints::new(image.height() as f32);

        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(|e| encode_err("create page", e))?;

        let mut image_object = PdfPageImageObject::new(&document, image)
            .map_err(|e| encode_err("embed image", e))?;
        image_object
            .scale(width.value, height.value)
            .map_err(|e| encode_err("scale image", e))?;

        page.objects_mut()
            .add_object(PdfPageObject::Image(image_object))
            .map_err(|e| encode_err("place image", e))?;

        debug!(
            "Page {} ← {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
    }

    document
        .save_to_bytes()
        .map_err(|e| encode_err("serialise document", e))
}

/// Accumulates pages from source PDFs into one new document.
///
/// Sources are appended one at a time so the caller can report progress per
/// source; nothing reaches the filesystem until the caller writes the bytes
/// returned by [`Merger::finish`].
pub struct Merger<'a> {
    pdfium: &'a Pdfium,
    merged: PdfDocument<'a>,
    dest: PathBuf,
}

impl<'a> Merger<'a> {
    pub fn new(pdfium: &'a Pdfium, dest: &Path) -> Result<Self, ConvertError> {
        let merged = pdfium
            .create_new_pdf()
            .map_err(|e| ConvertError::Encode {
                path: dest.to_path_buf(),
                detail: format!("create document: {:?}", e),
            })?;
        Ok(Self {
            pdfium,
            merged,
            dest: dest.to_path_buf(),
        })
    }

    /// Append every page of `source_path`; returns how many were copied.
    pub fn append(&mut self, source_path: &Path) -> Result<usize, ConvertError> {
        let source = open(self.pdfium, source_path)?;
        let pages = source.pages().len() as usize;
        self.merged
            .pages_mut()
            .append(&source)
            .map_err(|e| ConvertError::CorruptPdf {
                path: source_path.to_path_buf(),
                detail: format!("copying pages: {:?}", e),
            })?;
        debug!("Appended {} ({} pages)", source_path.display(), pages);
        Ok(pages)
    }

    /// Serialise the merged document.
    pub fn finish(self) -> Result<Vec<u8>, ConvertError> {
        self.merged
            .save_to_bytes()
            .map_err(|e| ConvertError::Encode {
                path: self.dest,
                detail: format!("serialise document: {:?}", e),
            })
    }
}

/// Rasterise the pages of `pdf_path` selected by `config.pages`.
///
/// Each rendered page is normalised to RGB8 and handed to `sink` together
/// with its 1-based page number, one page at a time, so only one bitmap is
/// alive at once. Returns the number of pages rendered.
pub fn render_pages<F>(
    pdfium: &Pdfium,
    pdf_path: &Path,
    config: &EngineConfig,
    mut sink: F,
) -> Result<usize, ConvertError>
where
    F: FnMut(usize, DynamicImage) -> Result<(), ConvertError>,
{
    let document = open(pdfium, pdf_path)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let indices = config.pages.to_indices(total_pages);
    if indices.is_empty() {
        return Err(ConvertError::Validation(format!(
            "page selection {:?} matches no page of '{}' ({} pages)",
            config.pages,
            pdf_path.display(),
            total_pages
        )));
    }

    let mut render_config = PdfRenderConfig::new().scale_page_by_factor(config.render_scale());
    if let Some(max_pixels) = config.max_rendered_pixels {
        let max_pixels = i32::try_from(max_pixels).unwrap_or(i32::MAX);
        render_config = render_config
            .set_maximum_width(max_pixels)
            .set_maximum_height(max_pixels);
    }

    for &idx in &indices {
        let raster_err = |e: PdfiumError| ConvertError::RasterisationFailed {
            path: pdf_path.to_path_buf(),
            page: idx + 1,
            detail: format!("{:?}", e),
        };

        let page = pages.get(idx as u16).map_err(raster_err)?;
        let bitmap = page.render_with_config(&render_config).map_err(raster_err)?;

        let image = decode::normalize(bitmap.as_image());
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        sink(idx + 1, image)?;
    }

    Ok(indices.len())
}

/// Read page count, version and Info-dictionary strings.
pub fn read_info(pdfium: &Pdfium, pdf_path: &Path) -> Result<DocumentInfo, ConvertError> {
    let document = open(pdfium, pdf_path)?;
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentInfo {
        path: pdf_path.to_path_buf(),
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
