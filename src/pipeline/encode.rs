//! Image encoding: RGB8 `DynamicImage` → PNG / JPEG / HEIC bytes.
//!
//! Encoding happens in memory so a failing encoder never leaves a
//! half-written file behind; [`crate::pipeline::write`] puts the bytes on
//! disk afterwards.

use crate::error::ConvertError;
use crate::pipeline::heic;
use crate::request::TargetFormat;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Encode `img` as `format`.
///
/// `dest` is only used to label errors. `jpeg_quality` applies to JPEG and
/// HEIC.
pub fn encode_image(
    img: &DynamicImage,
    format: TargetFormat,
    jpeg_quality: u8,
    dest: &Path,
) -> Result<Vec<u8>, ConvertError> {
    let encode_err = |detail: String| ConvertError::Encode {
        path: dest.to_path_buf(),
        detail,
    };

    let mut buf = Vec::new();
    match format {
        TargetFormat::Png => img
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| encode_err(e.to_string()))?,
        TargetFormat::Jpg => img
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, jpeg_quality))
            .map_err(|e| encode_err(e.to_string()))?,
        TargetFormat::Heic => buf = heic::encode(img, jpeg_quality, dest)?,
        TargetFormat::Pdf => {
            return Err(ConvertError::unsupported(
                "PDF is not an image encoding; use images-to-pdf",
            ))
        }
    }

    debug!("Encoded {} → {} bytes {}", dest.display(), buf.len(), format);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn red() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 0])))
    }

    #[test]
    fn png_has_signature() {
        let bytes = encode_image(&red(), TargetFormat::Png, 90, Path::new("a.png")).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn jpeg_has_soi_marker_and_quality_matters() {
        let photo = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        }));
        let hi = encode_image(&photo, TargetFormat::Jpg, 95, Path::new("a.jpg")).unwrap();
        let lo = encode_image(&photo, TargetFormat::Jpg, 10, Path::new("a.jpg")).unwrap();
        assert_eq!(&hi[..2], &[0xFF, 0xD8]);
        assert!(lo.len() < hi.len(), "lo={} hi={}", lo.len(), hi.len());
    }

    #[test]
    fn pdf_is_not_an_image_target() {
        let e = encode_image(&red(), TargetFormat::Pdf, 90, Path::new("a.pdf")).unwrap_err();
        assert!(matches!(e, ConvertError::UnsupportedFormat { .. }));
    }

    #[cfg(not(feature = "heic"))]
    #[test]
    fn heic_without_codec_is_an_encode_error() {
        let e = encode_image(&red(), TargetFormat::Heic, 90, Path::new("a.heic")).unwrap_err();
        assert!(matches!(e, ConvertError::Encode { .. }), "got {e}");
    }
}
