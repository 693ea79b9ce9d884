//! Canvas rendering.
//!
//! A redraw has two independent layers:
//!
//! - the picture, culled to the visible region and resampled at a quality
//!   tier chosen from the interaction state ([`TieredRenderer`])
//! - the frame overlay (mask, outline, thirds guides), cached and
//!   composited on top ([`compose_overlay`], [`compose_canvas`])
//!
//! While the user drags or spins the wheel the picture is drawn with
//! nearest-neighbour sampling; once the gesture ends (or the wheel has been
//! quiet for the idle delay) one final bilinear render follows.

mod interaction;
mod overlay;
mod renderer;
mod tier;

pub use interaction::IdleTimer;
pub use overlay::{
    compose_canvas, compose_overlay, frame_bounds, OverlayStyle, CANVAS_BACKGROUND, GUIDE_COLOR,
    OUTLINE_COLOR, OUTLINE_WIDTH,
};
pub use renderer::{plan_visible_region, RenderPlan, RenderedLayer, TieredRenderer};
pub use tier::{choose_tier, InteractionMode, QualityTier, TierThresholds};
