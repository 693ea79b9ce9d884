//! Pan/zoom state of one picture under a fixed crop frame.
//!
//! # Clamp law
//!
//! After every mutation the frame must lie entirely inside the scaled
//! picture:
//!
//! 1. If the scaled picture is narrower or shorter than the frame, the scale
//!    is raised to `min_scale = max(frameW / imgW, frameH / imgH)`.
//! 2. Each axis of the offset is then clamped on its own so no frame edge
//!    falls outside the picture. This is a min/max clamp, never a
//!    re-centering: a picture dragged past the left edge stops flush with
//!    it and keeps its vertical position.
//!
//! All coordinates are canvas pixels; `offset` is where the top-left corner
//! of the scaled picture sits on the canvas.

use serde::{Deserialize, Serialize};

use super::Rotation;
use crate::geometry::{Point, Rect, Size};

/// Tolerance for containment checks after floating point clamping.
pub const COVERAGE_EPSILON: f64 = 1e-6;

/// Snapshot of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Canvas pixels per source pixel.
    pub scale: f64,
    /// Canvas position of the scaled picture's top-left corner.
    pub offset: Point,
    /// Net quarter-turn rotation of the picture.
    pub rotation: Rotation,
}

/// Viewport for one picture against one crop frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportTransform {
    /// Picture size before rotation.
    source: Size,
    frame: Rect,
    state: ViewportState,
    max_scale: Option<f64>,
}

impl ViewportTransform {
    /// Smallest scale at which `image` still covers `frame` on both axes.
    ///
    /// Degenerate inputs fall back to `1.0`.
    pub fn min_scale(image: Size, frame: Size) -> f64 {
        if image.is_degenerate() || frame.is_degenerate() {
            return 1.0;
        }
        (frame.width / image.width).max(frame.height / image.height)
    }

    /// Fit an unrotated picture: minimum scale, centered on the frame.
    pub fn fit(image: Size, frame: Rect) -> Self {
        Self::fit_rotated(image, frame, Rotation::NONE)
    }

    /// Fit a picture shown under `rotation`.
    pub fn fit_rotated(source: Size, frame: Rect, rotation: Rotation) -> Self {
        let mut viewport = Self {
            source,
            frame,
            state: ViewportState {
                scale: 1.0,
                offset: Point::default(),
                rotation,
            },
            max_scale: None,
        };
        viewport.refit();
        viewport
    }

    /// Cap zoom at `max_scale`. The cap never undercuts the minimum scale.
    pub fn with_max_scale(mut self, max_scale: Option<f64>) -> Self {
        self.max_scale = max_scale.filter(|m| m.is_finite() && *m > 0.0);
        self.clamp();
        self
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn offset(&self) -> Point {
        self.state.offset
    }

    pub fn rotation(&self) -> Rotation {
        self.state.rotation
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Footprint of the picture as displayed, after rotation.
    pub fn image_size(&self) -> Size {
        self.state.rotation.apply_to_size(self.source)
    }

    /// Minimum scale for the current picture footprint and frame.
    pub fn current_min_scale(&self) -> f64 {
        Self::min_scale(self.image_size(), self.frame.size())
    }

    /// Canvas rectangle covered by the scaled picture.
    pub fn scaled_rect(&self) -> Rect {
        let size = self.image_size();
        Rect::new(
            self.state.offset.x,
            self.state.offset.y,
            size.width * self.state.scale,
            size.height * self.state.scale,
        )
    }

    /// The frame expressed in (rotated) source pixels.
    ///
    /// Returns an empty rectangle if the scale is unusable.
    pub fn source_rect(&self) -> Rect {
        let scale = self.state.scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Rect::default();
        }
        Rect::new(
            (self.frame.left() - self.state.offset.x) / scale,
            (self.frame.top() - self.state.offset.y) / scale,
            self.frame.width / scale,
            self.frame.height / scale,
        )
    }

    /// True if the frame lies inside the scaled picture.
    pub fn covers_frame(&self) -> bool {
        self.scaled_rect()
            .contains_rect(&self.frame, COVERAGE_EPSILON * self.frame.width.max(self.frame.height).max(1.0))
    }

    /// Translate the picture by `(dx, dy)` canvas pixels, then clamp.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.state.offset.x += dx;
        self.state.offset.y += dy;
        self.clamp();
    }

    /// Multiply the scale by `factor`, keeping `pivot` fixed on the canvas.
    ///
    /// The result never drops below the minimum scale.
    pub fn zoom(&mut self, factor: f64, pivot: Point) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let old = self.state.scale;
        let mut next = old * factor;
        if let Some(max) = self.max_scale {
            next = next.min(max);
        }
        next = next.max(self.current_min_scale());

        let ratio = next / old;
        self.state.offset.x = pivot.x - (pivot.x - self.state.offset.x) * ratio;
        self.state.offset.y = pivot.y - (pivot.y - self.state.offset.y) * ratio;
        self.state.scale = next;
        self.clamp();
    }

    /// Step the rotation by -90 degrees and fit again.
    pub fn rotate(&mut self) {
        self.state.rotation = self.state.rotation.step();
        self.refit();
    }

    /// Move to new frame geometry, keeping scale and position where the
    /// clamp law allows.
    pub fn retarget(&mut self, frame: Rect) {
        self.frame = frame;
        self.clamp();
    }

    /// Reset to minimum scale with the picture centered on the frame.
    pub fn refit(&mut self) {
        let size = self.image_size();
        let scale = self.current_min_scale();
        let center = self.frame.center();
        self.state.scale = scale;
        self.state.offset = Point::new(
            center.x - size.width * scale / 2.0,
            center.y - size.height * scale / 2.0,
        );
        self.clamp();
    }

    /// Enforce the clamp law.
    pub fn clamp(&mut self) {
        let size = self.image_size();
        if size.is_degenerate() || self.frame.is_empty() {
            return;
        }

        let min_scale = self.current_min_scale();
        if !(self.state.scale.is_finite() && self.state.scale > 0.0) {
            self.state.scale = min_scale;
        }
        if size.width * self.state.scale < self.frame.width
            || size.height * self.state.scale < self.frame.height
        {
            self.state.scale = self.state.scale.max(min_scale);
        }

        let w = size.width * self.state.scale;
        let h = size.height * self.state.scale;
        self.state.offset.x = self
            .state
            .offset
            .x
            .min(self.frame.left())
            .max(self.frame.right() - w);
        self.state.offset.y = self
            .state
            .offset
            .y
            .min(self.frame.top())
            .max(self.frame.bottom() - h);
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn size_strategy() -> impl Strategy<Value = Size> {
        (1.0f64..8000.0, 1.0f64..8000.0).prop_map(|(w, h)| Size::new(w, h))
    }

    fn frame_strategy() -> impl Strategy<Value = Rect> {
        (50.0f64..1200.0, 50.0f64..1200.0, -500.0f64..1500.0, -500.0f64..1500.0)
            .prop_map(|(w, h, cx, cy)| Rect::centered(Point::new(cx, cy), Size::new(w, h)))
    }

    proptest! {
        /// Property: fit lands exactly on the minimum scale.
        #[test]
        fn prop_fit_scale_is_exact_min_scale(
            image in size_strategy(),
            frame in frame_strategy(),
        ) {
            let vp = ViewportTransform::fit(image, frame);
            let expected = (frame.width / image.width).max(frame.height / image.height);
            prop_assert_eq!(vp.scale(), expected);
        }

        /// Property: after any zoom and pan the frame is covered.
        #[test]
        fn prop_pan_keeps_frame_covered(
            image in size_strategy(),
            frame in frame_strategy(),
            zoom in 0.1f64..6.0,
            (px, py) in (-3000.0f64..3000.0, -3000.0f64..3000.0),
            (dx, dy) in (-1.0e5f64..1.0e5, -1.0e5f64..1.0e5),
        ) {
            let mut vp = ViewportTransform::fit(image, frame);
            vp.zoom(zoom, Point::new(px, py));
            vp.pan(dx, dy);

            prop_assert!(vp.scale() >= vp.current_min_scale());
            prop_assert!(vp.covers_frame(), "frame {:?} not inside {:?}", frame, vp.scaled_rect());
        }

        /// Property: rotation preserves coverage.
        #[test]
        fn prop_rotate_keeps_frame_covered(
            image in size_strategy(),
            frame in frame_strategy(),
            turns in 1usize..=4,
        ) {
            let mut vp = ViewportTransform::fit(image, frame);
            for _ in 0..turns {
                vp.rotate();
            }
            prop_assert!(vp.covers_frame());
            prop_assert_eq!(vp.scale(), vp.current_min_scale());
        }

        /// Property: switching frames keeps the picture covering the new frame.
        #[test]
        fn prop_retarget_keeps_frame_covered(
            image in size_strategy(),
            first in frame_strategy(),
            second in frame_strategy(),
            (dx, dy) in (-2000.0f64..2000.0, -2000.0f64..2000.0),
        ) {
            let mut vp = ViewportTransform::fit(image, first);
            vp.pan(dx, dy);
            vp.retarget(second);
            prop_assert!(vp.covers_frame());
        }
    }
}
