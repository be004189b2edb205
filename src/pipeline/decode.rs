//! Image decoding: file → RGB8 `DynamicImage`.
//!
//! Every decoded image is normalised to 8-bit RGB. Alpha is dropped, not
//! composited, and palette/grayscale/16-bit inputs are widened or narrowed.
//! PDF pages and JPEG output cannot carry alpha anyway, and one colour mode
//! keeps every encoder on the same path.

use crate::error::ConvertError;
use crate::pipeline::{heic, input};
use crate::request::lowercase_extension;
use image::{DynamicImage, ImageReader};
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Decode the image at `path` and normalise it to RGB8.
///
/// The container format is sniffed from the content; the extension is only
/// used to route `.heic` files to libheif.
pub fn decode_image(path: &Path) -> Result<DynamicImage, ConvertError> {
    let file = input::open_readable(path)?;

    let image = if lowercase_extension(path).as_deref() == Some("heic") {
        drop(file);
        heic::decode(path)?
    } else {
        let decode_err = |detail: String| ConvertError::Decode {
            path: path.to_path_buf(),
            detail,
        };
        ImageReader::new(BufReader::new(file))
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?
    };

    debug!(
        "Decoded {} → {}x{} {:?}",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(normalize(image))
}

/// Convert any colour mode to RGB8.
pub fn normalize(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgba, RgbaImage};

    #[test]
    fn normalize_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 0])));
        let rgb = normalize(rgba);
        assert_eq!(rgb.color(), ColorType::Rgb8);
        assert_eq!(rgb.to_rgb8().get_pixel(3, 1).0, [10, 20, 30]);
    }

    #[test]
    fn decodes_png_by_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        // PNG bytes behind a .jpg name still decode.
        let path = dir.path().join("mislabelled.jpg");
        RgbaImage::from_pixel(3, 5, Rgba([1, 2, 3, 255]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let img = decode_image(&path).unwrap();
        assert_eq!((img.width(), img.height()), (3, 5));
        assert_eq!(img.color(), ColorType::Rgb8);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let e = decode_image(&path).unwrap_err();
        assert!(matches!(e, ConvertError::Decode { .. }), "got {e}");
    }
}
