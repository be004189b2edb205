//! # pdfium-auto
//!
//! Find a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, downloading and caching the platform build
//! when nothing is installed.
//!
//! ## Resolution order
//!
//! [`resolve_library`] walks these sources, first hit wins:
//!
//! 1. an explicit path handed in by the caller,
//! 2. `PDFIUM_LIB_PATH`,
//! 3. the per-version cache directory (see [`pdfium_cache_dir`]),
//! 4. a download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    unpacked into the cache (only when [`Resolve::AllowDownload`]).
//!
//! ```rust,no_run
//! use pdfium_auto::{bind_pdfium, Resolve};
//!
//! let pdfium = bind_pdfium(None, Resolve::AllowDownload, None).expect("PDFium unavailable");
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH`: path to an existing pdfium library; skips download.
//! - `PDFIUM_AUTO_CACHE_DIR`: override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

/// GitHub release base URL.
const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Directory name under the platform cache dir.
const CACHE_NAMESPACE: &str = "imgpdf";

/// Download progress: `(bytes_downloaded, total_bytes_if_known)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors returned by pdfium-auto operations.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    /// The current OS/architecture combination has no published build.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No library found locally and downloading was not allowed.
    #[error("No pdfium library found (looked in PDFIUM_LIB_PATH and {cache_dir:?})")]
    NotFound { cache_dir: PathBuf },

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },

    /// No system-wide pdfium could be bound.
    #[error("Failed to bind system PDFium library: {0}")]
    BindSystem(String),
}

/// Whether [`resolve_library`] may go to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    /// Only look at the explicit path, `PDFIUM_LIB_PATH` and the cache.
    LocalOnly,
    /// Fall back to downloading into the cache.
    AllowDownload,
}

struct PlatformInfo {
    /// Asset filename in the GitHub release, e.g. `pdfium-mac-arm64.tgz`.
    archive_name: &'static str,
    /// Relative path inside the archive, e.g. `lib/libpdfium.dylib`.
    lib_path_in_archive: &'static str,
    /// Filename written to the cache, e.g. `libpdfium.dylib`.
    lib_name: &'static str,
}

fn detect_platform() -> Result<PlatformInfo, PdfiumAutoError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    let (archive_name, lib_path_in_archive, lib_name) = match (os, arch) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        ("windows", "x86") => ("pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll"),
        (os, arch) => {
            return Err(PdfiumAutoError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    Ok(PlatformInfo {
        archive_name,
        lib_path_in_archive,
        lib_name,
    })
}

/// Returns the per-version cache directory for the PDFium library.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/imgpdf/pdfium-{VERSION}/`
/// - **Linux**: `~/.cache/imgpdf/pdfium-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\imgpdf\pdfium-{VERSION}\`
///
/// Override by setting `PDFIUM_AUTO_CACHE_DIR`.
pub fn pdfium_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(override_dir).join(format!("pdfium-{PDFIUM_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join(CACHE_NAMESPACE)
        .join(format!("pdfium-{PDFIUM_VERSION}"))
}

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns a library path that can be bound without touching the network,
/// or `None`.
///
/// Checks `PDFIUM_LIB_PATH` and the cache directory, in that order.
pub fn find_local_library() -> Option<PathBuf> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Some(path.clone());
    }
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Some(pb);
        }
    }
    let info = detect_platform().ok()?;
    let cached = pdfium_cache_dir().join(info.lib_name);
    cached.exists().then_some(cached)
}

/// Resolves the path of a pdfium shared library.
///
/// `explicit` wins when it exists. A path resolved from the environment,
/// cache or a download is memoised for the rest of the process.
pub fn resolve_library(
    explicit: Option<&Path>,
    mode: Resolve,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        warn!(path = %path.display(), "explicit pdfium library not found, falling back");
    }

    if let Some(path) = find_local_library() {
        let _ = RESOLVED_PATH.set(path.clone());
        return Ok(path);
    }

    if mode == Resolve::LocalOnly {
        return Err(PdfiumAutoError::NotFound {
            cache_dir: pdfium_cache_dir(),
        });
    }

    let path = download_into_cache(on_progress)?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Resolves a library (see [`resolve_library`]) and binds to it.
pub fn bind_pdfium(
    explicit: Option<&Path>,
    mode: Resolve,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Pdfium, PdfiumAutoError> {
    let lib_path = resolve_library(explicit, mode, on_progress)?;
    bind_pdfium_from_path(&lib_path)
}

/// Binds to a PDFium library at an explicit `path`.
///
/// Does not interact with the download / cache layer.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    debug!(path = %path.display(), "binding pdfium");
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        })
}

/// Binds to a pdfium library installed system-wide (loader search path).
pub fn bind_system_library() -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::BindSystem(format!("{e:?}")))
}

fn download_into_cache(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    let info = detect_platform()?;
    let cache_dir = pdfium_cache_dir();
    let lib_path = cache_dir.join(info.lib_name);

    let url = format!(
        "{}/chromium%2F{}/{}",
        BASE_URL, PDFIUM_VERSION, info.archive_name
    );
    info!(%url, "downloading pdfium");

    std::fs::create_dir_all(&cache_dir).map_err(PdfiumAutoError::CacheDir)?;

    let archive_bytes = download_bytes(&url, on_progress)?;
    extract_library(&archive_bytes, info.lib_path_in_archive, &lib_path)?;

    info!(path = %lib_path.display(), "pdfium cached");
    Ok(lib_path)
}

/// Streams a URL into a `Vec<u8>`, calling `on_progress` every 64 KiB.
fn download_bytes(
    url: &str,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let capacity = total.unwrap_or(35 * 1024 * 1024) as usize;
    let mut buf = Vec::with_capacity(capacity);

    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PdfiumAutoError::Download(format!("Read error: {e}")));
            }
        }
    }

    Ok(buf)
}

/// Extracts a single file from a gzipped tar archive into `dest_path`.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PdfiumAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(archive_bytes));

    for entry in archive
        .entries()
        .map_err(|e| PdfiumAutoError::Extract(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| PdfiumAutoError::Extract(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| PdfiumAutoError::Extract(e.to_string()))?
            .into_owned();

        if entry_path.to_string_lossy() == lib_path_in_archive {
            entry
                .unpack(dest_path)
                .map_err(|e| PdfiumAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "Library '{lib_path_in_archive}' not found in archive"
    )))
}
