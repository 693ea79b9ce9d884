//! Viewport-culled, tiered rendering of the picture layer.
//!
//! Only the part of the picture that lands on the canvas is cropped and
//! resampled. At high zoom on a large photo this is the difference between
//! resizing a few hundred source pixels and resizing the whole bitmap to a
//! size far beyond the screen.

use image::RgbaImage;
use log::debug;
use serde::{Deserialize, Serialize};

use super::interaction::IdleTimer;
use super::overlay::{compose_canvas, compose_overlay, OverlayStyle};
use super::tier::{choose_tier, InteractionMode, QualityTier, TierThresholds};
use crate::decode::{resize, DecodedImage};
use crate::geometry::{Rect, Size};
use crate::transform::{crop_pixels, ViewportState};

/// What to crop from the source and where the result goes on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    /// Source box `(left, top, right, bottom)`, right and bottom exclusive.
    pub source: (u32, u32, u32, u32),
    /// Size of the resampled result.
    pub dest_size: (u32, u32),
    /// Canvas position of the result's top-left corner.
    pub position: (i64, i64),
}

impl RenderPlan {
    pub fn source_size(&self) -> (u32, u32) {
        (
            self.source.2 - self.source.0,
            self.source.3 - self.source.1,
        )
    }
}

/// A resampled piece of the picture, ready to blit.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLayer {
    pub image: DecodedImage,
    pub position: (i64, i64),
    pub tier: QualityTier,
}

/// Work out the visible part of a `image_size` picture under `viewport`.
///
/// Returns `None` when the picture does not touch the canvas.
pub fn plan_visible_region(
    image_size: (u32, u32),
    viewport: &ViewportState,
    canvas: Size,
) -> Option<RenderPlan> {
    let scale = viewport.scale;
    if !(scale.is_finite() && scale > 0.0) || image_size.0 == 0 || image_size.1 == 0 {
        return None;
    }
    let scaled = Rect::new(
        viewport.offset.x,
        viewport.offset.y,
        image_size.0 as f64 * scale,
        image_size.1 as f64 * scale,
    );
    let visible = scaled.intersect(&Rect::new(0.0, 0.0, canvas.width, canvas.height))?;

    let src_x1 = (visible.left() - viewport.offset.x) / scale;
    let src_y1 = (visible.top() - viewport.offset.y) / scale;
    let src_x2 = (visible.right() - viewport.offset.x) / scale;
    let src_y2 = (visible.bottom() - viewport.offset.y) / scale;

    let clamp_x = |v: f64| v.clamp(0.0, image_size.0 as f64) as u32;
    let clamp_y = |v: f64| v.clamp(0.0, image_size.1 as f64) as u32;
    let source = (
        clamp_x(src_x1.floor()),
        clamp_y(src_y1.floor()),
        clamp_x(src_x2.floor() + 1.0),
        clamp_y(src_y2.floor() + 1.0),
    );
    let dest_size = (visible.width as u32, visible.height as u32);
    if source.2 <= source.0 || source.3 <= source.1 || dest_size.0 == 0 || dest_size.1 == 0 {
        return None;
    }

    Some(RenderPlan {
        source,
        dest_size,
        position: (visible.left() as i64, visible.top() as i64),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OverlayKey {
    canvas: (u32, u32),
    frame: (i64, i64, i64, i64),
    style: OverlayStyle,
}

impl OverlayKey {
    fn new(canvas: (u32, u32), frame: Rect, style: OverlayStyle) -> Self {
        Self {
            canvas,
            frame: (
                frame.left().round() as i64,
                frame.top().round() as i64,
                frame.right().round() as i64,
                frame.bottom().round() as i64,
            ),
            style,
        }
    }
}

/// Draws the picture layer and owns the interaction state that picks its
/// quality.
#[derive(Debug)]
pub struct TieredRenderer {
    thresholds: TierThresholds,
    mode: InteractionMode,
    timer: IdleTimer,
    last_tier: Option<QualityTier>,
    overlay: Option<(OverlayKey, RgbaImage)>,
}

impl TieredRenderer {
    pub fn new(thresholds: TierThresholds, timer: IdleTimer) -> Self {
        Self {
            thresholds,
            mode: InteractionMode::Settled,
            timer,
            last_tier: None,
            overlay: None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Pointer pressed: interactive until [`end_gesture`](Self::end_gesture).
    pub fn begin_gesture(&mut self) {
        self.timer.cancel();
        self.mode = InteractionMode::Interactive;
    }

    /// Pointer released. Returns `true` if the caller should issue a final
    /// smooth render.
    pub fn end_gesture(&mut self) -> bool {
        self.settle()
    }

    /// A wheel step: interactive now, settling after the idle delay.
    pub fn wheel(&mut self) {
        self.mode = InteractionMode::Interactive;
        self.timer.schedule();
    }

    /// An idle timeout arrived. Returns `true` if it settled the renderer.
    pub fn idle_timeout(&mut self, generation: u64) -> bool {
        if !self.timer.is_current(generation) {
            debug!("Ignoring stale idle timeout {}", generation);
            return false;
        }
        self.settle()
    }

    /// Forget per-picture state. Called when a new picture is shown.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.mode = InteractionMode::Settled;
        self.last_tier = None;
    }

    fn settle(&mut self) -> bool {
        self.timer.cancel();
        let was_interactive = self.mode == InteractionMode::Interactive;
        self.mode = InteractionMode::Settled;
        was_interactive
    }

    /// Tier the next render of `image_size` under `viewport` will use.
    pub fn tier_for(&self, image_size: (u32, u32), viewport: &ViewportState) -> QualityTier {
        let scaled = Size::new(
            image_size.0 as f64 * viewport.scale,
            image_size.1 as f64 * viewport.scale,
        );
        choose_tier(self.mode, scaled, viewport.scale, &self.thresholds)
    }

    /// Render the visible part of `image`.
    pub fn render(
        &mut self,
        image: &DecodedImage,
        viewport: &ViewportState,
        canvas: Size,
    ) -> Option<RenderedLayer> {
        let plan = plan_visible_region((image.width, image.height), viewport, canvas)?;
        let tier = self.tier_for((image.width, image.height), viewport);
        if self.last_tier != Some(tier) {
            debug!("Render tier {:?} ({:?})", tier, self.mode);
            self.last_tier = Some(tier);
        }
        debug!(
            "Culled render: source {:?} -> {:?} at {:?}",
            plan.source, plan.dest_size, plan.position
        );

        let (left, top, _, _) = plan.source;
        let (src_w, src_h) = plan.source_size();
        let region = crop_pixels(image, left, top, src_w, src_h)?;
        let resized = match resize(&region, plan.dest_size.0, plan.dest_size.1, tier.filter()) {
            Ok(resized) => resized,
            Err(e) => {
                debug!("Render resize failed: {}", e);
                return None;
            }
        };

        Some(RenderedLayer {
            image: resized,
            position: plan.position,
            tier,
        })
    }

    /// The overlay for this canvas, frame and style, rebuilt only when one
    /// of them changes.
    pub fn overlay(&mut self, canvas: (u32, u32), frame: Rect, style: OverlayStyle) -> &RgbaImage {
        let key = OverlayKey::new(canvas, frame, style);
        if self.overlay.as_ref().is_some_and(|(cached, _)| *cached != key) {
            self.overlay = None;
        }
        let (_, image) = self.overlay.get_or_insert_with(|| {
            debug!("Rebuilding overlay for {:?}", key.frame);
            (key, compose_overlay(canvas.0, canvas.1, frame, style))
        });
        image
    }

    /// Render and composite a full canvas frame.
    pub fn compose(
        &mut self,
        image: Option<(&DecodedImage, &ViewportState)>,
        canvas: (u32, u32),
        frame: Rect,
        style: OverlayStyle,
    ) -> image::RgbImage {
        let canvas_size = Size::from_pixels(canvas.0, canvas.1);
        let layer = image.and_then(|(img, vp)| self.render(img, vp, canvas_size));
        let overlay = self.overlay(canvas, frame, style);
        compose_canvas(canvas.0, canvas.1, layer.as_ref(), overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::transform::Rotation;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn state(scale: f64, x: f64, y: f64) -> ViewportState {
        ViewportState {
            scale,
            offset: Point::new(x, y),
            rotation: Rotation::NONE,
        }
    }

    fn renderer() -> TieredRenderer {
        let (tx, _rx) = unbounded();
        let timer = IdleTimer::new(Duration::from_secs(60), tx).unwrap();
        TieredRenderer::new(TierThresholds::default(), timer)
    }

    #[test]
    fn test_plan_culls_huge_image() {
        // 10000x10000 at 4x, zoomed into the middle, shown on 800x600
        let plan = plan_visible_region(
            (10_000, 10_000),
            &state(4.0, -20_000.0, -20_000.0),
            Size::new(800.0, 600.0),
        )
        .unwrap();
        let (w, h) = plan.source_size();
        assert!(w <= 800 / 4 + 1, "width {}", w);
        assert!(h <= 600 / 4 + 1, "height {}", h);
        assert_eq!(plan.source.0, 5000);
        assert_eq!(plan.source.1, 5000);
        assert_eq!(plan.dest_size, (800, 600));
        assert_eq!(plan.position, (0, 0));
    }

    #[test]
    fn test_plan_partial_overlap() {
        let plan = plan_visible_region((100, 100), &state(1.0, 50.0, -20.0), Size::new(100.0, 100.0))
            .unwrap();
        assert_eq!(plan.position, (50, 0));
        assert_eq!(plan.dest_size, (50, 80));
        assert_eq!(plan.source, (0, 20, 51, 100));
    }

    #[test]
    fn test_plan_offscreen_is_none() {
        assert!(plan_visible_region((100, 100), &state(1.0, 500.0, 0.0), Size::new(100.0, 100.0)).is_none());
        assert!(plan_visible_region((100, 100), &state(0.0, 0.0, 0.0), Size::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn test_render_places_layer() {
        let mut r = renderer();
        let image = DecodedImage::filled(40, 40, [9, 9, 9]);
        let layer = r.render(&image, &state(2.0, 10.0, 10.0), Size::new(100.0, 100.0)).unwrap();
        assert_eq!(layer.position, (10, 10));
        assert_eq!((layer.image.width, layer.image.height), (80, 80));
        assert_eq!(layer.tier, QualityTier::Smooth);
    }

    #[test]
    fn test_gesture_switches_tier() {
        let mut r = renderer();
        let image = DecodedImage::filled(20, 20, [1, 2, 3]);
        let vp = state(1.0, 0.0, 0.0);

        r.begin_gesture();
        assert_eq!(r.mode(), InteractionMode::Interactive);
        assert_eq!(r.tier_for((20, 20), &vp), QualityTier::Fast);
        assert_eq!(r.render(&image, &vp, Size::new(50.0, 50.0)).unwrap().tier, QualityTier::Fast);

        assert!(r.end_gesture());
        assert_eq!(r.tier_for((20, 20), &vp), QualityTier::Smooth);
        assert!(!r.end_gesture());
    }

    #[test]
    fn test_wheel_settles_on_current_timeout_only() {
        let mut r = renderer();
        r.wheel();
        let stale = r.timer.generation();
        r.wheel();
        let current = r.timer.generation();

        assert!(!r.idle_timeout(stale));
        assert_eq!(r.mode(), InteractionMode::Interactive);
        assert!(r.idle_timeout(current));
        assert_eq!(r.mode(), InteractionMode::Settled);
    }

    #[test]
    fn test_overlay_cache_reuse() {
        let mut r = renderer();
        let frame = Rect::new(10.0, 10.0, 20.0, 20.0);
        let first = r.overlay((50, 50), frame, OverlayStyle::default()).clone();
        let again = r.overlay((50, 50), frame, OverlayStyle::default()).clone();
        assert_eq!(first, again);

        let moved = r.overlay((50, 50), Rect::new(5.0, 5.0, 20.0, 20.0), OverlayStyle::default()).clone();
        assert_ne!(first, moved);
    }

    #[test]
    fn test_compose_without_image() {
        let mut r = renderer();
        let canvas = r.compose(None, (40, 30), Rect::new(10.0, 5.0, 20.0, 20.0), OverlayStyle::default());
        assert_eq!(canvas.dimensions(), (40, 30));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
