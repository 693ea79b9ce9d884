//! Picture placement under the crop frame.
//!
//! # Coordinate System
//!
//! - Canvas coordinates are pixels of the visible drawing surface
//! - Source coordinates are pixels of the (rotated) decoded bitmap
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Origin is top-left corner, y grows downward
//!
//! A [`ViewportTransform`] maps source to canvas with one uniform scale and
//! an offset. Crops are taken from the rotated bitmap with
//! [`crop_region`] using the viewport's [`ViewportTransform::source_rect`].

mod crop;
mod rotation;
mod viewport;

pub use crop::{crop_pixels, crop_region};
pub use rotation::Rotation;
pub use viewport::{ViewportState, ViewportTransform, COVERAGE_EPSILON};
