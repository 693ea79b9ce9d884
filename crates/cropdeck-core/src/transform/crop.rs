//! Pixel cropping in source coordinates.
//!
//! Two entry points share the same copy loop:
//! - [`crop_pixels`] takes an integer box and is what the renderer uses for
//!   the visible sub-region.
//! - [`crop_region`] takes the floating point rectangle produced by the
//!   viewport, rounds its edges to the nearest pixel and is what exports use.
//!
//! Neither pads: boxes are clamped to the bitmap, and an empty or inverted
//! box yields `None` rather than a 1x1 placeholder.

use crate::decode::DecodedImage;
use crate::geometry::Rect;

/// Copy the `width` x `height` block whose top-left pixel is `(left, top)`.
///
/// The block is clamped to the image. Returns `None` when nothing remains.
pub fn crop_pixels(
    image: &DecodedImage,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> Option<DecodedImage> {
    let right = left.saturating_add(width).min(image.width);
    let bottom = top.saturating_add(height).min(image.height);
    if left >= right || top >= bottom {
        return None;
    }

    let out_width = right - left;
    let out_height = bottom - top;
    let src_stride = image.width as usize * 3;
    let row_bytes = out_width as usize * 3;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    for y in top..bottom {
        let start = y as usize * src_stride + left as usize * 3;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    Some(DecodedImage::new(out_width, out_height, output))
}

/// Crop a source-space rectangle, rounding each edge to the nearest pixel.
///
/// Returns `None` for empty, inverted or non-finite rectangles and for
/// rectangles that fall entirely outside the image.
pub fn crop_region(image: &DecodedImage, rect: Rect) -> Option<DecodedImage> {
    if rect.is_empty() || !rect.x.is_finite() || !rect.y.is_finite() {
        return None;
    }

    let max_x = image.width as f64;
    let max_y = image.height as f64;
    let left = rect.left().round().clamp(0.0, max_x) as u32;
    let top = rect.top().round().clamp(0.0, max_y) as u32;
    let right = rect.right().round().clamp(0.0, max_x) as u32;
    let bottom = rect.bottom().round().clamp(0.0, max_y) as u32;
    if right <= left || bottom <= top {
        return None;
    }

    crop_pixels(image, left, top, right - left, bottom - top)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_image(width: u32, height: u32) -> DecodedImage {
        DecodedImage::filled(width, height, [10, 20, 30])
    }

    proptest! {
        /// Property: output never exceeds the source and matches its buffer size.
        #[test]
        fn prop_output_bounded_by_input(
            (width, height) in (4u32..=60, 4u32..=60),
            (x, y, w, h) in (-20.0f64..80.0, -20.0f64..80.0, 0.0f64..90.0, 0.0f64..90.0),
        ) {
            let img = create_test_image(width, height);
            if let Some(out) = crop_region(&img, Rect::new(x, y, w, h)) {
                prop_assert!(out.width >= 1 && out.width <= width);
                prop_assert!(out.height >= 1 && out.height <= height);
                prop_assert_eq!(out.pixels.len(), (out.width * out.height * 3) as usize);
            }
        }

        /// Property: an in-bounds rectangle crops to its rounded size.
        #[test]
        fn prop_in_bounds_size_matches_rounding(
            (width, height) in (20u32..=60, 20u32..=60),
            (fx, fy, fw, fh) in (0.0f64..0.4, 0.0f64..0.4, 0.2f64..0.6, 0.2f64..0.6),
        ) {
            let img = create_test_image(width, height);
            let rect = Rect::new(fx * width as f64, fy * height as f64, fw * width as f64, fh * height as f64);
            let out = crop_region(&img, rect).unwrap();
            let expected_w = (rect.right().round() - rect.left().round()) as u32;
            let expected_h = (rect.bottom().round() - rect.top().round()) as u32;
            prop_assert_eq!(out.width, expected_w);
            prop_assert_eq!(out.height, expected_h);
        }
    }
}
