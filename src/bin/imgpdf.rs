//! CLI binary for imgpdf.
//!
//! A thin shim over the library crate that maps CLI flags onto an
//! `EngineConfig` and a `ConversionRequest`, then prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use imgpdf::{
    ensure_pdf_extension, execute_async, inspect_async, zip_outputs, zip_path_for, ConversionProgressCallback,
    ConversionRequest, ConversionResult, EngineConfig, InputKind, InputFile, Operation,
    PageSelection, PdfiumSource, ProgressCallback, TargetFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the inputs of the request, plus a
/// log line per finished input.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} inputs  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn take_elapsed(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_inputs: usize) {
        self.bar.set_length(total_inputs as u64);
        self.bar.reset_eta();
    }

    fn on_input_start(&self, _index: usize, _total: usize, path: &Path) {
        if let Ok(mut t) = self.started.lock() {
            *t = Some(Instant::now());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
    }

    fn on_input_complete(&self, index: usize, total: usize, outputs: &[PathBuf]) {
        let elapsed = self.take_elapsed();
        let produced = match outputs.len() {
            0 => String::new(),
            1 => format!("→ {}", outputs[0].display()),
            n => format!("→ {n} files"),
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            produced,
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_input_error(&self, index: usize, total: usize, error: &str) {
        let elapsed = self.take_elapsed();
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_inputs: usize, succeeded: usize) {
        self.bar.finish_and_clear();
        if succeeded == total_inputs {
            eprintln!(
                "{} {} input(s) converted",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} input(s) converted  ({} failed, rest not attempted)",
                red("✘"),
                bold(&succeeded.to_string()),
                total_inputs,
                red(&self.errors.load(Ordering::SeqCst).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Images to one PDF, pages in argument order
  imgpdf --to pdf -o album.pdf a.png b.jpg c.heic

  # Transcode images into a directory (out/a.jpg, out/b.jpg)
  imgpdf --to jpg --quality 85 -o out a.png b.png

  # One PNG per page (pages/report_page_1.png, …)
  imgpdf --to png -o pages report.pdf

  # Pages 2-4 at 150 DPI, in pages/report/, zipped as pages.zip
  imgpdf --to jpg --dpi 150 --pages 2-4 --page-subfolder --zip -o pages report.pdf

  # Merge PDFs in order
  imgpdf --to pdf -o merged.pdf part1.pdf part2.pdf part3.pdf

  # Inspect PDF metadata
  imgpdf --inspect-only report.pdf

  # JSON result for scripting
  imgpdf --json --to png -o pages report.pdf > result.json

OPERATION SELECTION (when --op is not given):
  Inputs        Target          Operation
  ───────────   ─────────────   ──────────────
  images        pdf             images-to-pdf
  images        jpg/png/heic    convert-images
  PDFs          pdf             merge-pdfs
  PDFs          jpg/png/heic    pdf-to-images

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override the log filter (e.g. imgpdf=debug)

SETUP:
  PDFium (~30 MB) is downloaded automatically the first time a PDF is
  created, merged or rasterised, and cached in ~/.cache/imgpdf/pdfium-7690/.
  To use an existing pdfium copy: PDFIUM_LIB_PATH=/path/to/libpdfium imgpdf ...
  HEIC needs a build with `--features heic` and a system libheif.
"#;

/// Convert between images and PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "imgpdf",
    version,
    about = "Convert between images and PDF documents",
    long_about = "Convert images (PNG, JPEG, HEIC) to a multi-page PDF, rasterise PDF pages \
to images, transcode between image formats, and merge PDFs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input files (.png .jpg .jpeg .heic .pdf), in output order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target format: pdf, jpg, png, heic.
    #[arg(long, env = "IMGPDF_TO", value_enum, required_unless_present = "inspect_only")]
    to: Option<FormatArg>,

    /// Force the operation instead of inferring it from inputs and target.
    #[arg(long, env = "IMGPDF_OP", value_enum)]
    op: Option<OpArg>,

    /// Output file for PDF targets, output directory for image targets.
    #[arg(short, long, env = "IMGPDF_OUTPUT", required_unless_present = "inspect_only")]
    output: Option<PathBuf>,

    /// Rasterisation DPI for PDF pages (36–600; 72 = native size).
    #[arg(long, env = "IMGPDF_DPI", default_value_t = 72,
          value_parser = clap::value_parser!(u32).range(36..=600))]
    dpi: u32,

    /// JPEG / HEIC quality (1–100).
    #[arg(long, env = "IMGPDF_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Page selection for PDF inputs: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "IMGPDF_PAGES", default_value = "all")]
    pages: String,

    /// Cap the longest edge of a rendered page, in pixels.
    #[arg(long, env = "IMGPDF_MAX_PIXELS",
          value_parser = clap::value_parser!(u32).range(16..=32_768))]
    max_pixels: Option<u32>,

    /// Write the pages of each PDF into <output>/<pdfbase>/.
    #[arg(long, env = "IMGPDF_PAGE_SUBFOLDER")]
    page_subfolder: bool,

    /// Also bundle the produced files into <output>.zip.
    #[arg(long, env = "IMGPDF_ZIP")]
    zip: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON instead of the file list.
    #[arg(long, env = "IMGPDF_JSON")]
    json: bool,

    /// Path to an existing pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Never download pdfium; use PDFIUM_LIB_PATH or the cache only.
    #[arg(long, env = "IMGPDF_NO_DOWNLOAD")]
    no_download: bool,

    /// Disable progress bar.
    #[arg(long, env = "IMGPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMGPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMGPDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    #[value(alias = "jpeg")]
    Jpg,
    Png,
    #[value(alias = "heif")]
    Heic,
}

impl From<FormatArg> for TargetFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Pdf => TargetFormat::Pdf,
            FormatArg::Jpg => TargetFormat::Jpg,
            FormatArg::Png => TargetFormat::Png,
            FormatArg::Heic => TargetFormat::Heic,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OpArg {
    ImagesToPdf,
    ConvertImages,
    PdfToImages,
    MergePdfs,
}

impl From<OpArg> for Operation {
    fn from(v: OpArg) -> Self {
        match v {
            OpArg::ImagesToPdf => Operation::ImagesToPdf,
            OpArg::ConvertImages => Operation::ConvertImages,
            OpArg::PdfToImages => Operation::PdfToImages,
            OpArg::MergePdfs => Operation::MergePdfs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, resolve_pdfium(&cli)?, None)?;
        return inspect_inputs(&cli, config).await;
    }

    // ── Build request ────────────────────────────────────────────────────
    let request = build_request(&cli)?;
    let pdfium = if request.operation == Operation::ConvertImages {
        // Transcoding never touches pdfium; don't download it for nothing.
        pdfium_source_without_download(&cli)
    } else {
        resolve_pdfium(&cli)?
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, pdfium, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let zip_target = zip_path_for(&request.destination, request.operation);
    let result = execute_async(config, request)
        .await
        .context("Conversion failed")?;

    let zip_path = if cli.zip {
        let files: Vec<&Path> = result.artifacts.paths();
        tokio::task::block_in_place(|| zip_outputs(files.as_slice(), &zip_target))
            .with_context(|| format!("Failed to write {}", zip_target.display()))?;
        Some(zip_target)
    } else {
        None
    };

    print_result(&cli, &result, zip_path.as_deref())
}

/// Map CLI args to `EngineConfig`.
fn build_config(
    cli: &Cli,
    pdfium: PdfiumSource,
    progress: Option<ProgressCallback>,
) -> Result<EngineConfig> {
    let pages: PageSelection = cli.pages.parse().context("Invalid --pages")?;

    let mut builder = EngineConfig::builder()
        .dpi(cli.dpi)
        .jpeg_quality(cli.quality)
        .pages(pages)
        .page_subfolder(cli.page_subfolder)
        .pdfium(pdfium);

    if let Some(px) = cli.max_pixels {
        builder = builder.max_rendered_pixels(px);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Map CLI args to a `ConversionRequest`, inferring the operation if needed.
fn build_request(cli: &Cli) -> Result<ConversionRequest> {
    let target: TargetFormat = cli
        .to
        .context("--to is required unless --inspect-only is given")?
        .into();
    let output = cli
        .output
        .clone()
        .context("--output is required unless --inspect-only is given")?;

    let destination = if target == TargetFormat::Pdf {
        PathBuf::from(ensure_pdf_extension(&output.to_string_lossy()))
    } else {
        output
    };

    let request = match cli.op {
        Some(op) => ConversionRequest::new(cli.inputs.iter(), op.into(), target, destination),
        None => ConversionRequest::infer(cli.inputs.iter(), target, destination),
    }
    .context("Invalid request")?;
    request.validate().context("Invalid request")?;
    Ok(request)
}

// ── pdfium setup ─────────────────────────────────────────────────────────────

/// Where to bind pdfium from, without ever downloading.
fn pdfium_source_without_download(cli: &Cli) -> PdfiumSource {
    match &cli.pdfium_lib {
        Some(path) => PdfiumSource::Library(path.clone()),
        None => PdfiumSource::Auto {
            allow_download: false,
        },
    }
}

/// Make sure a pdfium library is on disk and return where it is.
///
/// On the very first run this downloads the library (~30 MB) from
/// bblanchon/pdfium-binaries into ~/.cache/imgpdf/pdfium-{VERSION}/ behind an
/// indicatif bar. Later runs find it in the cache immediately.
fn resolve_pdfium(cli: &Cli) -> Result<PdfiumSource> {
    if cli.pdfium_lib.is_some() || cli.no_download {
        return Ok(pdfium_source_without_download(cli));
    }
    if let Some(path) = pdfium_auto::find_local_library() {
        return Ok(PdfiumSource::Library(path));
    }

    let path = if cli.quiet {
        // Quiet mode: download silently; errors still propagate.
        tokio::task::block_in_place(|| {
            pdfium_auto::resolve_library(None, pdfium_auto::Resolve::AllowDownload, None)
        })
        .context("Failed to download PDFium engine")?
    } else {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("PDF engine");
        dl_bar.set_message("Connecting…");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        // block_in_place keeps the borrowed callback valid while moving the
        // blocking download off the async executor's hot path.
        let path = tokio::task::block_in_place(|| {
            pdfium_auto::resolve_library(
                None,
                pdfium_auto::Resolve::AllowDownload,
                Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }),
            )
        })
        .context("Failed to download PDFium engine")?;

        dl_bar.finish_with_message("ready ✓");
        path
    };

    Ok(PdfiumSource::Library(path))
}

// ── Output ───────────────────────────────────────────────────────────────────

async fn inspect_inputs(cli: &Cli, config: EngineConfig) -> Result<()> {
    let mut infos = Vec::new();
    for path in &cli.inputs {
        let input = InputFile::from_path(path).context("Unsupported input")?;
        if input.kind() != InputKind::Pdf {
            anyhow::bail!("--inspect-only expects PDF inputs, got {}", path.display());
        }
        let info = inspect_async(config.clone(), path.clone())
            .await
            .with_context(|| format!("Failed to inspect {}", path.display()))?;
        infos.push(info);
    }

    if cli.json {
        let json = if infos.len() == 1 {
            serde_json::to_string_pretty(&infos[0])
        } else {
            serde_json::to_string_pretty(&infos)
        }
        .context("Failed to serialise metadata")?;
        println!("{json}");
        return Ok(());
    }

    for (i, meta) in infos.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("File:         {}", meta.path.display());
        if let Some(ref t) = meta.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = meta.author {
            println!("Author:       {}", a);
        }
        if let Some(ref s) = meta.subject {
            println!("Subject:      {}", s);
        }
        println!("Pages:        {}", meta.page_count);
        println!("PDF Version:  {}", meta.pdf_version);
        if let Some(ref p) = meta.producer {
            println!("Producer:     {}", p);
        }
        if let Some(ref c) = meta.creator {
            println!("Creator:      {}", c);
        }
        if let Some(ref d) = meta.creation_date {
            println!("Created:      {}", d);
        }
        if let Some(ref d) = meta.modification_date {
            println!("Modified:     {}", d);
        }
    }
    Ok(())
}

fn print_result(cli: &Cli, result: &ConversionResult, zip: Option<&Path>) -> Result<()> {
    if cli.json {
        let mut value = serde_json::to_value(result).context("Failed to serialise result")?;
        if let (Some(zip), Some(obj)) = (zip, value.as_object_mut()) {
            obj.insert("zip".into(), serde_json::json!(zip));
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise result")?
        );
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    for path in result.artifacts.paths() {
        println!("{}", path.display());
    }
    eprintln!(
        "{}  {}  {} file(s), {} page(s)  {}ms",
        green("✔"),
        cyan(&result.operation.to_string()),
        result.artifacts.len(),
        result.total_pages(),
        result.duration_ms,
    );
    if let Some(zip) = zip {
        eprintln!("   {} {}", dim("zip:"), bold(&zip.display().to_string()));
    }
    Ok(())
}
