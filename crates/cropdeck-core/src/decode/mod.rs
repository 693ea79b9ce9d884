//! Image decoding and resampling.
//!
//! This module provides functionality for:
//! - Decoding every eligible source format (JPEG, PNG, WebP, BMP, TIFF)
//! - Applying EXIF orientation so the bitmap is upright on load
//! - Resampling with a selectable filter for rendering, export and previews
//!
//! # Examples
//!
//! ```ignore
//! use cropdeck_core::decode::{decode_file, resize, FilterType};
//!
//! let image = decode_file(Path::new("set_image/cat.png"))?;
//! let half = resize(&image, image.width / 2, image.height / 2, FilterType::Bilinear)?;
//! ```

mod file;
mod resize;
mod types;

pub use file::{decode_file, decode_image, get_orientation, read_dimensions};
pub use resize::{generate_preview, resize, resize_to_fit};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
