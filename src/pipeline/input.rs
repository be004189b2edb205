//! Input checks performed before any decoder sees a file.
//!
//! Decoders and pdfium report a missing file, a permission problem and a
//! corrupt file all the same way. Checking up front turns those into
//! distinct [`ConvertError`] variants that name the path.

use crate::error::ConvertError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// Open `path` for reading, mapping I/O failures onto input errors.
pub fn open_readable(path: &Path) -> Result<File, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if path.is_dir() {
        return Err(ConvertError::Decode {
            path: path.to_path_buf(),
            detail: "is a directory".into(),
        });
    }

    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        ErrorKind::NotFound => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConvertError::Decode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })
}

/// Check that `path` is readable and starts with the `%PDF` magic bytes.
///
/// Files shorter than four bytes are rejected as not-a-PDF.
pub fn check_pdf(path: &Path) -> Result<(), ConvertError> {
    let mut f = open_readable(path)?;
    let mut magic = [0u8; 4];
    let mut read = 0;
    while read < magic.len() {
        match f.read(&mut magic[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ConvertError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })
            }
        }
    }
    if &magic != b"%PDF" {
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_by_path() {
        let e = open_readable(Path::new("/definitely/not/a/real/file.png")).unwrap_err();
        assert!(matches!(e, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let e = open_readable(dir.path()).unwrap_err();
        assert!(matches!(e, ConvertError::Decode { .. }));
    }

    #[test]
    fn pdf_magic_is_checked() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("good.pdf");
        std::fs::write(&good, b"%PDF-1.7\n%...").unwrap();
        check_pdf(&good).unwrap();

        let bad = dir.path().join("bad.pdf");
        std::fs::write(&bad, b"PK\x03\x04zip really").unwrap();
        match check_pdf(&bad).unwrap_err() {
            ConvertError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other}"),
        }

        let short = dir.path().join("short.pdf");
        std::fs::write(&short, b"%P").unwrap();
        assert!(matches!(
            check_pdf(&short).unwrap_err(),
            ConvertError::NotAPdf { .. }
        ));
    }
}
