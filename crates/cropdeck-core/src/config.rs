//! Directory layout constants and per-run settings.
//!
//! Nothing here is persisted: a [`CropperConfig`] lives for one run and is
//! built by the front end (command line flags, or defaults).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Source images, optionally grouped one level deep in subfolders.
pub const SOURCE_DIR: &str = "set_image";
/// Exported crops, mirroring the source subfolder.
pub const OUTPUT_DIR: &str = "save_image";
/// Discarded sources, mirroring the source subfolder.
pub const SOURCE_TRASH_DIR: &str = "trash_bin";
/// Discarded exports. Flat: shared by every subfolder.
pub const OUTPUT_TRASH_DIR: &str = "trash_bin_save";

/// Extension every export is written with.
pub const EXPORT_EXTENSION: &str = "jpg";
/// Fixed JPEG quality for exports.
pub const EXPORT_QUALITY: u8 = 98;

/// Extensions (lowercase, no dot) eligible as source images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "webp", "bmp", "tif", "jpeg"];

/// Frame edge length used when sizing a frame from a ratio.
pub const CROP_BOX_SIZE: f64 = 512.0;
/// Smallest frame edge reachable by manual nudging.
pub const MIN_FRAME_EDGE: f64 = 50.0;

/// Runtime settings for a cropping session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropperConfig {
    /// Folder holding the four working trees.
    pub root: PathBuf,
    /// Visible canvas width in pixels.
    pub canvas_width: u32,
    /// Visible canvas height in pixels.
    pub canvas_height: u32,
    /// Base frame edge for ratio sizing.
    pub crop_box_size: f64,
    /// Alpha (0-255) of the mask drawn outside the frame.
    pub mask_opacity: u8,
    /// Draw rule-of-thirds guides inside the frame.
    pub show_grid: bool,
    /// Route magnifying exports through the upscaler when it is ready.
    pub use_upscale: bool,
    /// Quiet period after the last wheel event before settling.
    pub idle_delay_ms: u64,
    /// Scaled-image pixel count above which zoomed renders use the fast tier.
    pub fast_tier_pixel_limit: u64,
    /// Scale above which the pixel limit applies.
    pub fast_tier_min_scale: f64,
    /// Optional cap on zoom, bounding the size of very large renders.
    pub max_scale: Option<f64>,
    /// JPEG quality for exports.
    pub export_quality: u8,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            canvas_width: 740,
            canvas_height: 850,
            crop_box_size: CROP_BOX_SIZE,
            mask_opacity: 180,
            show_grid: true,
            use_upscale: false,
            idle_delay_ms: 200,
            fast_tier_pixel_limit: 2000 * 2000,
            fast_tier_min_scale: 1.2,
            max_scale: None,
            export_quality: EXPORT_QUALITY,
        }
    }
}

impl CropperConfig {
    /// Default settings rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// True if `name` carries one of the eligible source extensions.
pub fn is_supported_image(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}
