//! Resampling quality selection.

use serde::{Deserialize, Serialize};

use crate::config::CropperConfig;
use crate::decode::FilterType;
use crate::geometry::Size;

/// How much effort a redraw spends on resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    /// Nearest neighbour: used while the picture is moving, and for very
    /// large zoomed renders.
    Fast,
    /// Bilinear.
    Smooth,
}

impl QualityTier {
    pub fn filter(self) -> FilterType {
        match self {
            QualityTier::Fast => FilterType::Nearest,
            QualityTier::Smooth => FilterType::Bilinear,
        }
    }
}

/// Whether a gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Dragging, or inside the quiet period after a wheel event.
    Interactive,
    #[default]
    Settled,
}

/// Limits above which a settled render still uses the fast tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Scaled width times scaled height.
    pub pixel_limit: u64,
    pub min_scale: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            pixel_limit: 2000 * 2000,
            min_scale: 1.2,
        }
    }
}

impl TierThresholds {
    pub fn from_config(config: &CropperConfig) -> Self {
        Self {
            pixel_limit: config.fast_tier_pixel_limit,
            min_scale: config.fast_tier_min_scale,
        }
    }
}

/// Pick the tier for a redraw of a picture whose scaled size is `scaled`.
pub fn choose_tier(
    mode: InteractionMode,
    scaled: Size,
    scale: f64,
    thresholds: &TierThresholds,
) -> QualityTier {
    if mode == InteractionMode::Interactive {
        return QualityTier::Fast;
    }
    let scaled_pixels = scaled.width.max(0.0) * scaled.height.max(0.0);
    if scaled_pixels > thresholds.pixel_limit as f64 && scale > thresholds.min_scale {
        QualityTier::Fast
    } else {
        QualityTier::Smooth
    }
}
