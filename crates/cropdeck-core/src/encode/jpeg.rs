//! JPEG encoding for exports.
//!
//! Exports are always baseline JPEG at a fixed high quality. The image
//! crate's encoder writes every component with 1x1 sampling, so chroma is
//! never subsampled.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::DecodedImage;

/// Why an export could not be written.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Pixel buffer holds {actual} bytes, {expected} needed")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("Cannot encode a {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("JPEG encoder: {0}")]
    EncodingFailed(String),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Encode an RGB bitmap to JPEG bytes.
///
/// `quality` is clamped to 1-100.
pub fn encode_jpeg(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(&image.pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode `image` and write it to `path`, replacing any existing file.
pub fn write_jpeg(image: &DecodedImage, path: &Path, quality: u8) -> Result<(), EncodeError> {
    let bytes = encode_jpeg(image, quality)?;
    std::fs::write(path, bytes).map_err(|source| EncodeError::Write {
        path: path.to_path_buf(),
        source,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: any well-formed bitmap encodes to a framed JPEG.
        #[test]
        fn prop_valid_input_produces_valid_jpeg(
            width in 1u32..=40,
            height in 1u32..=40,
            seed in any::<u8>(),
        ) {
            let size = (width as usize) * (height as usize) * 3;
            let pixels: Vec<u8> = (0..size).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();
            let jpeg = encode_jpeg(&DecodedImage::new(width, height, pixels), 98).unwrap();

            prop_assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
            prop_assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
        }

        /// Property: mismatched buffers are rejected, never encoded.
        #[test]
        fn prop_invalid_pixel_length_returns_error(
            width in 1u32..=20,
            height in 1u32..=20,
            delta in 1usize..=10,
        ) {
            let img = DecodedImage {
                width,
                height,
                pixels: vec![7u8; (width * height * 3) as usize + delta],
            };
            prop_assert!(
                matches!(
                    encode_jpeg(&img, 98),
                    Err(EncodeError::InvalidPixelData { .. })
                ),
                "Mismatched pixel data should return InvalidPixelData error"
            );
        }
    }
}
