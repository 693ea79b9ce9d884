//! Core bitmap and decoding types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Size;

/// Why a picture could not be turned into a bitmap.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes match none of the enabled formats.
    #[error("Unrecognized image format")]
    Unsupported,

    /// The format was recognized but the data is damaged or truncated.
    #[error("Damaged image data: {0}")]
    Corrupt(String),

    /// The file could not be read.
    #[error("Cannot read image: {0}")]
    Read(String),

    /// A resample was asked for an empty target.
    #[error("Cannot resample to {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
}

/// Resampling kernel.
///
/// `Nearest` backs the fast render tier, `Bilinear` the smooth one and
/// `Lanczos3` every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    Nearest,
    #[default]
    Bilinear,
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// The EXIF `Orientation` tag. Unknown values read as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Mirrored along the main diagonal.
    Transpose = 5,
    Rotate90CW = 6,
    /// Mirrored along the anti-diagonal.
    Transverse = 7,
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(tag: u32) -> Self {
        match tag {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded RGB8 bitmap.
///
/// The session owns one of these per loaded item and replaces it wholesale
/// on navigation or rotation; nothing edits the pixels in place.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Packed RGB, row-major.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap a packed RGB buffer of `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width as usize) * (height as usize) * 3);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A bitmap filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self::new(width, height, pixels)
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Copy into an `RgbImage`. `None` if the buffer length is off.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Consume into an image::RgbImage without copying the buffer.
    pub fn into_rgb_image(self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels)
    }

    /// Dimensions as a floating point size.
    pub fn size(&self) -> Size {
        Size::from_pixels(self.width, self.height)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Zero-area or bufferless.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// RGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}
