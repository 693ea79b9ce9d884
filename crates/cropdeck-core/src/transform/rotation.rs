//! Quarter-turn rotation.
//!
//! Rotation in the cropper is never continuous: the user steps the picture
//! a quarter turn at a time. Angles follow the usual convention of positive
//! degrees meaning counter-clockwise, so a `-90` step turns the picture
//! clockwise on screen.

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;
use crate::geometry::Size;

/// Net rotation of the displayed picture: 0, 90, 180 or 270 degrees
/// counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rotation(u16);

impl Rotation {
    /// No rotation.
    pub const NONE: Rotation = Rotation(0);

    /// Snap an arbitrary angle to the nearest quarter turn, wrapping mod 360.
    pub fn from_degrees(degrees: i32) -> Self {
        let quarters = (degrees as f64 / 90.0).round() as i32;
        Rotation((quarters.rem_euclid(4) * 90) as u16)
    }

    /// Counter-clockwise angle in degrees, always one of 0, 90, 180, 270.
    pub fn degrees(self) -> u16 {
        self.0
    }

    /// The rotation after one more `-90` step.
    pub fn step(self) -> Self {
        Rotation((self.0 + 270) % 360)
    }

    /// True for odd multiples of 90, where width and height trade places.
    pub fn swaps_dimensions(self) -> bool {
        self.0 % 180 == 90
    }

    /// Footprint of a `size` picture under this rotation.
    pub fn apply_to_size(self, size: Size) -> Size {
        if self.swaps_dimensions() {
            size.transposed()
        } else {
            size
        }
    }

    /// Rotate a bitmap. The canvas grows to fit, so nothing is clipped.
    pub fn apply(self, image: &DecodedImage) -> DecodedImage {
        let Some(rgb) = image.to_rgb_image() else {
            return image.clone();
        };
        let rotated = match self.0 {
            90 => image::imageops::rotate270(&rgb),
            180 => image::imageops::rotate180(&rgb),
            270 => image::imageops::rotate90(&rgb),
            _ => return image.clone(),
        };
        DecodedImage::from_rgb_image(rotated)
    }
}
