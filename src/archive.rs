//! Bundle conversion outputs into a single `.zip`.
//!
//! Multi-file results (one image per input or per page) are awkward to hand
//! over as a directory; a web front end returns them as one download.

use crate::error::ConvertError;
use crate::pipeline::write;
use crate::request::Operation;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write `files` into a deflate-compressed zip at `zip_path`.
///
/// Entries are named by file name only, in the order given. A later file
/// with the same name as an earlier one is stored under `<stem>_<n>.<ext>`.
/// The archive is built under `<zip>.tmp` and renamed into place, so a
/// failing member leaves no truncated zip behind. Returns the number of
/// entries written.
pub fn zip_outputs<P: AsRef<Path>>(files: &[P], zip_path: &Path) -> Result<usize, ConvertError> {
    write::ensure_parent(zip_path)?;
    let tmp = write::temp_name(zip_path);

    let written = match write_archive(files, &tmp, zip_path) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
    };
    if let Err(e) = fs::rename(&tmp, zip_path) {
        let _ = fs::remove_file(&tmp);
        return Err(ConvertError::write_failed(zip_path, e));
    }

    info!("Wrote {} ({} entries)", zip_path.display(), written);
    Ok(written)
}

/// Where the archive of a conversion into `destination` goes: `<output>.zip`
/// next to the output file or directory.
///
/// `merged.pdf` becomes `merged.zip`; the directory `pages/` becomes
/// `pages.zip`, whatever subfolders the pages were written to.
pub fn zip_path_for(destination: &Path, operation: Operation) -> PathBuf {
    if operation.writes_single_file() {
        return destination.with_extension("zip");
    }
    match destination.file_name() {
        Some(name) => {
            let mut name = name.to_os_string();
            name.push(".zip");
            destination.with_file_name(name)
        }
        None => destination.join("output.zip"),
    }
}

fn write_archive<P: AsRef<Path>>(
    files: &[P],
    tmp: &Path,
    zip_path: &Path,
) -> Result<usize, ConvertError> {
    let out = File::create(tmp).map_err(|e| ConvertError::write_failed(zip_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let zip_err = |e: zip::result::ZipError| ConvertError::write_failed(zip_path, io::Error::other(e));
    let mut names = HashSet::new();

    for file in files {
        let file = file.as_ref();
        let name = unique_entry_name(file, &mut names);

        let mut src = File::open(file).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConvertError::FileNotFound {
                path: file.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: file.to_path_buf(),
            },
            _ => ConvertError::write_failed(zip_path, e),
        })?;

        zip.start_file(name.as_str(), options).map_err(zip_err)?;
        let bytes = io::copy(&mut src, &mut zip).map_err(|e| ConvertError::write_failed(zip_path, e))?;
        debug!("Zipped {} as {} ({} bytes)", file.display(), name, bytes);
    }

    zip.finish().map_err(zip_err)?;
    Ok(names.len())
}

fn unique_entry_name(file: &Path, taken: &mut HashSet<String>) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    if taken.insert(name.clone()) {
        return name;
    }

    let stem = crate::request::file_stem(file);
    let ext = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
