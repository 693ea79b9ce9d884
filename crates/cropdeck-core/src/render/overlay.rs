//! Frame overlay and final canvas composition.
//!
//! The overlay depends only on the canvas size, the frame rectangle and the
//! style, never on the picture, so it is rebuilt rarely and composited over
//! every image render.

use image::{imageops, DynamicImage, Rgba, RgbaImage, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as PixelRect;
use serde::{Deserialize, Serialize};

use super::RenderedLayer;
use crate::geometry::Rect;

/// Canvas background, `#0F0F0F`.
pub const CANVAS_BACKGROUND: Rgba<u8> = Rgba([15, 15, 15, 255]);
/// Frame outline colour, `#00FF00`.
pub const OUTLINE_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
/// Outline thickness in pixels, drawn inward from the frame edge.
pub const OUTLINE_WIDTH: u32 = 2;
/// Rule-of-thirds guide colour.
pub const GUIDE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 80]);

/// Appearance options for the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Alpha of the dark mask outside the frame.
    pub mask_opacity: u8,
    pub show_grid: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            mask_opacity: 180,
            show_grid: true,
        }
    }
}

/// Integer pixel bounds `[x1, x2) x [y1, y2)` of the frame on the canvas.
pub fn frame_bounds(frame: Rect, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let clamp = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;
    (
        clamp(frame.left(), width),
        clamp(frame.top(), height),
        clamp(frame.right(), width),
        clamp(frame.bottom(), height),
    )
}

/// Draw the mask, guides and outline for `frame` on a transparent canvas.
pub fn compose_overlay(width: u32, height: u32, frame: Rect, style: OverlayStyle) -> RgbaImage {
    let mut overlay = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, style.mask_opacity]));
    let (x1, y1, x2, y2) = frame_bounds(frame, width, height);
    if x2 <= x1 || y2 <= y1 {
        return overlay;
    }
    let (w, h) = (x2 - x1, y2 - y1);

    // Pixels are replaced, not blended, so the window is cut out of the mask
    draw_filled_rect_mut(
        &mut overlay,
        PixelRect::at(x1 as i32, y1 as i32).of_size(w, h),
        Rgba([0, 0, 0, 0]),
    );

    if style.show_grid {
        let (top, bottom) = (y1 as f32, (y2 - 1) as f32);
        let (left, right) = (x1 as f32, (x2 - 1) as f32);
        for i in 1..=2 {
            let gx = (x1 + w * i / 3) as f32;
            let gy = (y1 + h * i / 3) as f32;
            draw_line_segment_mut(&mut overlay, (gx, top), (gx, bottom), GUIDE_COLOR);
            draw_line_segment_mut(&mut overlay, (left, gy), (right, gy), GUIDE_COLOR);
        }
    }

    for inset in 0..OUTLINE_WIDTH {
        if w <= 2 * inset || h <= 2 * inset {
            break;
        }
        let ring = PixelRect::at((x1 + inset) as i32, (y1 + inset) as i32)
            .of_size(w - 2 * inset, h - 2 * inset);
        draw_hollow_rect_mut(&mut overlay, ring, OUTLINE_COLOR);
    }

    overlay
}

/// Flatten the background, the image layer and the overlay into one frame.
pub fn compose_canvas(
    width: u32,
    height: u32,
    layer: Option<&RenderedLayer>,
    overlay: &RgbaImage,
) -> RgbImage {
    let mut canvas = RgbaImage::from_pixel(width, height, CANVAS_BACKGROUND);

    if let Some(layer) = layer {
        if let Some(rgb) = layer.image.to_rgb_image() {
            let rgba = DynamicImage::ImageRgb8(rgb).to_rgba8();
            imageops::replace(&mut canvas, &rgba, layer.position.0, layer.position.1);
        }
    }
    imageops::overlay(&mut canvas, overlay, 0, 0);

    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedImage;
    use crate::render::QualityTier;

    fn frame() -> Rect {
        Rect::new(20.0, 10.0, 60.0, 30.0)
    }

    #[test]
    fn test_overlay_mask_and_window() {
        let o = compose_overlay(100, 50, frame(), OverlayStyle { mask_opacity: 180, show_grid: false });
        assert_eq!(o.get_pixel(0, 0), &Rgba([0, 0, 0, 180]));
        // Interior is clear
        assert_eq!(o.get_pixel(45, 22), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_overlay_outline_is_two_pixels() {
        let o = compose_overlay(100, 50, frame(), OverlayStyle { mask_opacity: 180, show_grid: false });
        assert_eq!(o.get_pixel(20, 20), &OUTLINE_COLOR);
        assert_eq!(o.get_pixel(21, 20), &OUTLINE_COLOR);
        assert_eq!(o.get_pixel(22, 20), &Rgba([0, 0, 0, 0]));
        assert_eq!(o.get_pixel(79, 20), &OUTLINE_COLOR);
        assert_eq!(o.get_pixel(50, 39), &OUTLINE_COLOR);
        // Just outside the frame is mask
        assert_eq!(o.get_pixel(19, 20), &Rgba([0, 0, 0, 180]));
    }

    #[test]
    fn test_overlay_thirds_guides() {
        let with = compose_overlay(100, 50, frame(), OverlayStyle::default());
        let without = compose_overlay(100, 50, frame(), OverlayStyle { show_grid: false, ..OverlayStyle::default() });
        // x1 + 60/3 = 40, y1 + 30/3 = 20
        assert_eq!(with.get_pixel(40, 25), &GUIDE_COLOR);
        assert_eq!(with.get_pixel(60, 25), &GUIDE_COLOR);
        assert_eq!(with.get_pixel(30, 20), &GUIDE_COLOR);
        assert_eq!(without.get_pixel(40, 25), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_overlay_frame_outside_canvas() {
        let o = compose_overlay(10, 10, Rect::new(50.0, 50.0, 5.0, 5.0), OverlayStyle::default());
        assert!(o.pixels().all(|p| p[3] == 180));
    }

    #[test]
    fn test_compose_canvas_layers() {
        let layer = RenderedLayer {
            image: DecodedImage::filled(10, 10, [200, 100, 50]),
            position: (5, 5),
            tier: QualityTier::Smooth,
        };
        let overlay = compose_overlay(30, 30, Rect::new(0.0, 0.0, 30.0, 30.0), OverlayStyle { mask_opacity: 180, show_grid: false });
        let canvas = compose_canvas(30, 30, Some(&layer), &overlay);

        assert_eq!(canvas.dimensions(), (30, 30));
        assert_eq!(canvas.get_pixel(8, 8).0, [200, 100, 50]);
        assert_eq!(canvas.get_pixel(20, 20).0, [15, 15, 15]);
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 255, 0]);
    }

    #[test]
    fn test_compose_canvas_mask_darkens() {
        let layer = RenderedLayer {
            image: DecodedImage::filled(30, 30, [255, 255, 255]),
            position: (0, 0),
            tier: QualityTier::Smooth,
        };
        let overlay = compose_overlay(30, 30, Rect::new(10.0, 10.0, 10.0, 10.0), OverlayStyle { mask_opacity: 180, show_grid: false });
        let canvas = compose_canvas(30, 30, Some(&layer), &overlay);
        let masked = canvas.get_pixel(0, 0).0;
        assert!(masked[0] < 100, "mask should darken: {:?}", masked);
        assert_eq!(canvas.get_pixel(15, 15).0, [255, 255, 255]);
    }

    #[test]
    fn test_overlay_tiny_frame_is_all_outline() {
        let o = compose_overlay(10, 10, Rect::new(4.0, 4.0, 3.0, 3.0), OverlayStyle::default());
        for y in 4..7 {
            for x in 4..7 {
                assert_eq!(o.get_pixel(x, y), &OUTLINE_COLOR, "({x}, {y})");
            }
        }
        assert_eq!(o.get_pixel(3, 4), &Rgba([0, 0, 0, 180]));
        assert_eq!(o.get_pixel(7, 6), &Rgba([0, 0, 0, 180]));
    }
}
