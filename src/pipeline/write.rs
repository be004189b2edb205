//! Output placement: directories and atomic writes.

use crate::error::ConvertError;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<(), ConvertError> {
    fs::create_dir_all(dir).map_err(|e| ConvertError::write_failed(dir, e))
}

/// Create the parent directory of `file`, if it has one.
pub fn ensure_parent(file: &Path) -> Result<(), ConvertError> {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => ensure_dir(p),
        _ => Ok(()),
    }
}

/// Write `bytes` to `path` in place. Used for per-input and per-page outputs.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    fs::write(path, bytes).map_err(|e| ConvertError::write_failed(path, e))?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Write `bytes` next to `path` under a temporary name, then rename.
///
/// Readers of `path` see either the old file or the complete new one. On
/// failure the temporary file is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    ensure_parent(path)?;
    let tmp = temp_name(path);

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(ConvertError::write_failed(path, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ConvertError::write_failed(path, e));
    }

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// `<name>.tmp` next to `path`.
pub fn temp_name(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/out.pdf");

        write_atomic(&target, b"%PDF-1.7").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"%PDF-1.7");
        assert!(!dir.path().join("nested/deeper/out.pdf.tmp").exists());

        write_atomic(&target, b"%PDF-2.0").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"%PDF-2.0");
    }

    #[test]
    fn write_into_missing_directory_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing/x.png");
        match write_file(&target, b"x").unwrap_err() {
            ConvertError::OutputWriteFailed { path, .. } => assert_eq!(path, target),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn temp_name_appends_suffix() {
        assert_eq!(
            temp_name(Path::new("/a/b/merged.pdf")),
            Path::new("/a/b/merged.pdf.tmp")
        );
    }
}
