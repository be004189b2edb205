//! HEIC bridge.
//!
//! The `image` crate has no HEIF codec, so `.heic` goes through libheif
//! (`libheif-rs`). libheif is a system library, so the bridge is behind the
//! `heic` cargo feature; without it both directions fail with a message
//! naming the feature.

use crate::error::ConvertError;
use image::DynamicImage;
use std::path::Path;

#[cfg(feature = "heic")]
mod imp {
    use super::*;
    use image::RgbImage;
    use libheif_rs::{
        Channel, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, Image, LibHeif,
        RgbChroma,
    };
    use tracing::debug;

    pub fn decode(path: &Path) -> Result<DynamicImage, ConvertError> {
        let decode_err = |detail: String| ConvertError::Decode {
            path: path.to_path_buf(),
            detail,
        };

        let path_str = path
            .to_str()
            .ok_or_else(|| decode_err("path is not valid UTF-8".into()))?;
        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_file(path_str).map_err(|e| decode_err(e.to_string()))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| decode_err(e.to_string()))?;
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| decode_err(e.to_string()))?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| decode_err("no interleaved RGB plane".into()))?;
        let (w, h, stride) = (plane.width, plane.height, plane.stride);
        let row_bytes = w as usize * 3;

        // libheif pads rows to `stride`; RgbImage wants them packed.
        let mut pixels = Vec::with_capacity(row_bytes * h as usize);
        for row in plane.data.chunks(stride).take(h as usize) {
            pixels.extend_from_slice(&row[..row_bytes]);
        }
        let rgb = RgbImage::from_raw(w, h, pixels)
            .ok_or_else(|| decode_err("plane size does not match dimensions".into()))?;

        debug!("libheif decoded {} ({w}x{h})", path.display());
        Ok(DynamicImage::ImageRgb8(rgb))
    }

    pub fn encode(img: &DynamicImage, quality: u8, dest: &Path) -> Result<Vec<u8>, ConvertError> {
        let encode_err = |detail: String| ConvertError::Encode {
            path: dest.to_path_buf(),
            detail,
        };

        let rgb = img.to_rgb8();
        let (w, h) = rgb.dimensions();
        let row_bytes = w as usize * 3;

        let mut image = Image::new(w, h, ColorSpace::Rgb(RgbChroma::Rgb))
            .map_err(|e| encode_err(e.to_string()))?;
        image
            .create_plane(Channel::Interleaved, w, h, 8)
            .map_err(|e| encode_err(e.to_string()))?;
        {
            let planes = image.planes_mut();
            let plane = planes
                .interleaved
                .ok_or_else(|| encode_err("no interleaved RGB plane".into()))?;
            let stride = plane.stride;
            let data = plane.data;
            for (y, src) in rgb.as_raw().chunks(row_bytes).enumerate() {
                let start = y * stride;
                data[start..start + row_bytes].copy_from_slice(src);
            }
        }

        let lib = LibHeif::new();
        let mut ctx = HeifContext::new().map_err(|e| encode_err(e.to_string()))?;
        let mut encoder = lib
            .encoder_for_format(CompressionFormat::Hevc)
            .map_err(|e| encode_err(e.to_string()))?;
        encoder
            .set_quality(EncoderQuality::Lossy(quality))
            .map_err(|e| encode_err(e.to_string()))?;
        ctx.encode_image(&image, &mut encoder, None)
            .map_err(|e| encode_err(e.to_string()))?;
        ctx.write_to_bytes().map_err(|e| encode_err(e.to_string()))
    }
}

#[cfg(not(feature = "heic"))]
mod imp {
    use super::*;

    const MISSING: &str = "HEIC support not compiled in (enable the `heic` feature)";

    pub fn decode(path: &Path) -> Result<DynamicImage, ConvertError> {
        Err(ConvertError::Decode {
            path: path.to_path_buf(),
            detail: MISSING.into(),
        })
    }

    pub fn encode(_img: &DynamicImage, _quality: u8, dest: &Path) -> Result<Vec<u8>, ConvertError> {
        Err(ConvertError::Encode {
            path: dest.to_path_buf(),
            detail: MISSING.into(),
        })
    }
}

/// Decode the primary image of a HEIC file to RGB8.
pub fn decode(path: &Path) -> Result<DynamicImage, ConvertError> {
    imp::decode(path)
}

/// Encode `img` as HEVC-in-HEIF at `quality` (1–100).
pub fn encode(img: &DynamicImage, quality: u8, dest: &Path) -> Result<Vec<u8>, ConvertError> {
    imp::encode(img, quality, dest)
}

