//! Engine configuration.
//!
//! A [`ConversionEngine`](crate::ConversionEngine) carries exactly one
//! [`EngineConfig`] and nothing else, so two engines with equal configs
//! produce identical output for identical requests. Build it with
//! [`EngineConfig::builder()`]; setters clamp to the valid range and
//! [`EngineConfigBuilder::build`] rejects what cannot be clamped.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// PDF points per inch. Rendering at this DPI maps one point to one pixel.
pub const NATIVE_DPI: u32 = 72;

/// Bounds for [`EngineConfig::max_rendered_pixels`]. pdfium takes the cap as
/// an `i32`.
pub const MIN_RENDERED_EDGE: u32 = 16;
pub const MAX_RENDERED_EDGE: u32 = 32_768;

/// Configuration shared by every operation of a [`crate::ConversionEngine`].
///
/// # Example
/// ```rust
/// use imgpdf::{EngineConfig, PageSelection};
///
/// let config = EngineConfig::builder()
///     .dpi(150)
///     .jpeg_quality(85)
///     .pages(PageSelection::Range(1, 3))
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rasterisation DPI for PDF pages. Range: 36–600. Default: 72 (native,
    /// one pixel per point).
    pub dpi: u32,

    /// Optional cap on the longest edge of a rendered page, in pixels.
    pub max_rendered_pixels: Option<u32>,

    /// JPEG encoder quality, 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// Pages rasterised by PdfToImages. Default: all.
    pub pages: PageSelection,

    /// Write each PDF's pages into `<output_dir>/<pdfbase>/`. Default: false.
    pub page_subfolder: bool,

    /// Where the pdfium shared library comes from.
    pub pdfium: PdfiumSource,

    /// Per-input progress events.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dpi: NATIVE_DPI,
            max_rendered_pixels: None,
            jpeg_quality: 90,
            pages: PageSelection::default(),
            page_subfolder: false,
            pdfium: PdfiumSource::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("pages", &self.pages)
            .field("page_subfolder", &self.page_subfolder)
            .field("pdfium", &self.pdfium)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl EngineConfig {
    /// Create a new builder for `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check every range constraint.
    ///
    /// [`EngineConfigBuilder::build`] runs this, and so does the engine on
    /// every call, which covers configs built by hand or deserialised.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !(36..=600).contains(&self.dpi) {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be 36–600, got {}",
                self.dpi
            )));
        }
        if let Some(px) = self.max_rendered_pixels {
            if !(MIN_RENDERED_EDGE..=MAX_RENDERED_EDGE).contains(&px) {
                return Err(ConvertError::InvalidConfig(format!(
                    "max rendered pixels must be {MIN_RENDERED_EDGE}–{MAX_RENDERED_EDGE}, got {px}"
                )));
            }
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConvertError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                self.jpeg_quality
            )));
        }
        if let PageSelection::Range(start, end) = self.pages {
            if start == 0 || start > end {
                return Err(ConvertError::InvalidConfig(format!(
                    "invalid page range {start}-{end}"
                )));
            }
        }
        if let PdfiumSource::Library(ref path) = self.pdfium {
            if path.as_os_str().is_empty() {
                return Err(ConvertError::InvalidConfig(
                    "pdfium library path is empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Page scale factor passed to pdfium (`dpi / 72`).
    pub fn render_scale(&self) -> f32 {
        self.dpi as f32 / NATIVE_DPI as f32
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(36, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = Some(px.clamp(MIN_RENDERED_EDGE, MAX_RENDERED_EDGE));
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn page_subfolder(mut self, v: bool) -> Self {
        self.config.page_subfolder = v;
        self
    }

    pub fn pdfium(mut self, source: PdfiumSource) -> Self {
        self.config.pdfium = source;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EngineConfig, ConvertError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where to get the pdfium shared library from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PdfiumSource {
    /// `PDFIUM_LIB_PATH`, then the pdfium-auto cache, then (optionally) a
    /// download into that cache. (default, download allowed)
    Auto { allow_download: bool },
    /// A specific library file.
    Library(PathBuf),
    /// Whatever the dynamic loader finds system-wide.
    System,
}

impl Default for PdfiumSource {
    fn default() -> Self {
        PdfiumSource::Auto {
            allow_download: true,
        }
    }
}

/// Specifies which pages of a PDF to rasterise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    ///
    /// Pages beyond `total_pages` are dropped.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl std::str::FromStr for PageSelection {
    type Err = ConvertError;

    /// Parse `all`, `5`, `3-15` or `1,3,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let bad = |detail: String| ConvertError::InvalidConfig(format!("pages '{s}': {detail}"));
        let page = |p: &str| -> Result<usize, ConvertError> {
            let n: usize = p
                .trim()
                .parse()
                .map_err(|_| bad(format!("'{}' is not a page number", p.trim())))?;
            if n == 0 {
                return Err(bad("pages are 1-indexed".into()));
            }
            Ok(n)
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }
        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(bad("start must be <= end".into()));
            }
            return Ok(PageSelection::Range(start, end));
        }
        if s.contains(',') {
            let pages = s.split(',').map(&page).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }
        Ok(PageSelection::Single(page(&s)?))
    }
}
