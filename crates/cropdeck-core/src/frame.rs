//! Crop frame selection.
//!
//! The frame is the fixed-aspect window that stays centered on the canvas
//! while the picture moves underneath it. A selection is either a preset
//! ratio, a free-form ratio typed by the user, or a fixed output size in
//! pixels (any side above [`FIXED_SIZE_THRESHOLD`]).
//!
//! # Examples
//!
//! ```ignore
//! use cropdeck_core::frame::{parse_frame_request, FrameRequest};
//!
//! assert_eq!(
//!     parse_frame_request("16:9")?,
//!     FrameRequest::Ratio { width: 16.0, height: 9.0 }
//! );
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CROP_BOX_SIZE, MIN_FRAME_EDGE};
use crate::geometry::{Point, Rect, Size};

/// Ratio presets offered to the user, in display order.
pub const RATIO_PRESETS: &[&str] = &["1:1", "3:4", "4:3", "9:16", "16:9", "2:3", "3:2"];

/// Selection label used once the frame was resized by hand.
pub const CUSTOM_SELECTION: &str = "custom";

/// Values above this are pixel sizes rather than ratio terms.
pub const FIXED_SIZE_THRESHOLD: f64 = 30.0;

/// Effective resolution below this fraction of the target counts as
/// magnification.
pub const MAGNIFICATION_WARNING: f64 = 0.95;

/// Errors from frame selection.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameError {
    /// Input did not yield exactly two positive numbers
    #[error("Unparseable frame request: {0:?}")]
    UnparseableRatio(String),
}

/// A parsed frame selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FrameRequest {
    /// Aspect ratio `width:height`; output keeps the crop's own resolution.
    Ratio { width: f64, height: f64 },
    /// Exact output size in pixels.
    FixedSize { width: u32, height: u32 },
}

impl FrameRequest {
    /// On-canvas frame size for this request at base edge `base`.
    pub fn frame_size(&self, base: f64) -> Size {
        match *self {
            FrameRequest::Ratio { width, height } => ratio_frame_size(width / height, base),
            FrameRequest::FixedSize { width, height } => {
                let (w, h) = (width as f64, height as f64);
                let factor = 1.5 * base / w.max(h);
                if factor < 1.0 {
                    Size::new(w * factor, h * factor)
                } else {
                    ratio_frame_size(w / h, base)
                }
            }
        }
    }

    /// Locked output size, if any.
    pub fn fixed_output_size(&self) -> Option<(u32, u32)> {
        match *self {
            FrameRequest::FixedSize { width, height } => Some((width, height)),
            FrameRequest::Ratio { .. } => None,
        }
    }
}

/// Frame size for aspect `ratio`: the long side gets `base`.
pub fn ratio_frame_size(ratio: f64, base: f64) -> Size {
    if ratio >= 1.0 {
        Size::new(base, base / ratio)
    } else {
        Size::new(base * ratio, base)
    }
}

/// Parse user input such as `16:9`, `4x5`, `1920*1080` or `3, 2`.
///
/// Every run of characters other than digits and `.` separates tokens.
pub fn parse_frame_request(input: &str) -> Result<FrameRequest, FrameError> {
    let err = || FrameError::UnparseableRatio(input.to_string());

    let tokens: Vec<&str> = input
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|t| !t.is_empty())
        .collect();
    let [w, h] = tokens.as_slice() else {
        return Err(err());
    };

    let width: f64 = w.parse().map_err(|_| err())?;
    let height: f64 = h.parse().map_err(|_| err())?;
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(err());
    }

    if width > FIXED_SIZE_THRESHOLD || height > FIXED_SIZE_THRESHOLD {
        Ok(FrameRequest::FixedSize {
            width: (width as u32).max(1),
            height: (height as u32).max(1),
        })
    } else {
        Ok(FrameRequest::Ratio { width, height })
    }
}

/// The frame as drawn on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFrame {
    /// Always the canvas center.
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Set only in fixed-size mode.
    pub fixed_output_size: Option<(u32, u32)>,
}

impl CropFrame {
    pub fn rect(&self) -> Rect {
        Rect::centered(self.center, self.size())
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Current selection and the frame derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct CropFrameResolver {
    selection: String,
    request: FrameRequest,
    frame: CropFrame,
    base: f64,
}

impl CropFrameResolver {
    /// Start with a square frame centered on a canvas of `canvas` size.
    pub fn new(canvas: Size, base: f64) -> Self {
        let base = if base > 0.0 { base } else { CROP_BOX_SIZE };
        let request = FrameRequest::Ratio {
            width: 1.0,
            height: 1.0,
        };
        let size = request.frame_size(base);
        Self {
            selection: RATIO_PRESETS[0].to_string(),
            request,
            frame: CropFrame {
                center: Point::new(canvas.width / 2.0, canvas.height / 2.0),
                width: size.width,
                height: size.height,
                fixed_output_size: None,
            },
            base,
        }
    }

    pub fn frame(&self) -> &CropFrame {
        &self.frame
    }

    pub fn rect(&self) -> Rect {
        self.frame.rect()
    }

    /// Label of the active selection: a preset, the typed text, or
    /// [`CUSTOM_SELECTION`].
    pub fn selection(&self) -> &str {
        &self.selection
    }

    pub fn request(&self) -> FrameRequest {
        self.request
    }

    pub fn fixed_output_size(&self) -> Option<(u32, u32)> {
        self.frame.fixed_output_size
    }

    /// Commit a new selection. On error nothing changes.
    pub fn select(&mut self, token: &str) -> Result<&CropFrame, FrameError> {
        let request = parse_frame_request(token)?;
        let size = request.frame_size(self.base);
        self.selection = token.trim().to_string();
        self.request = request;
        self.frame.width = size.width;
        self.frame.height = size.height;
        self.frame.fixed_output_size = request.fixed_output_size();
        Ok(&self.frame)
    }

    /// Grow or shrink the frame by hand. Leaves fixed-size mode.
    pub fn nudge(&mut self, dw: f64, dh: f64) -> &CropFrame {
        self.frame.width = (self.frame.width + dw).max(MIN_FRAME_EDGE);
        self.frame.height = (self.frame.height + dh).max(MIN_FRAME_EDGE);
        self.frame.fixed_output_size = None;
        self.request = FrameRequest::Ratio {
            width: self.frame.width,
            height: self.frame.height,
        };
        self.selection = CUSTOM_SELECTION.to_string();
        &self.frame
    }

    /// Keep the frame centered after the canvas changes size.
    pub fn set_canvas_size(&mut self, canvas: Size) {
        self.frame.center = Point::new(canvas.width / 2.0, canvas.height / 2.0);
    }
}

/// True iff a fixed size is set and the crop, at `scale`, has fewer source
/// pixels than the target on either axis.
pub fn should_consider_upscale(frame: Size, scale: f64, fixed_output: Option<(u32, u32)>) -> bool {
    let Some((target_w, target_h)) = fixed_output else {
        return false;
    };
    if !(scale.is_finite() && scale > 0.0) {
        return false;
    }
    frame.width / scale < target_w as f64 || frame.height / scale < target_h as f64
}

/// Resolution readout for the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Source pixels covered by the frame.
    pub effective: (u32, u32),
    /// Locked output size, if any.
    pub target: Option<(u32, u32)>,
    /// How much the export will be enlarged, when it is noticeably.
    pub magnification: Option<f64>,
}

pub fn resolution_report(frame: &CropFrame, scale: f64) -> Option<ResolutionReport> {
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let effective = (
        (frame.width / scale).floor() as u32,
        (frame.height / scale).floor() as u32,
    );
    let magnification = frame.fixed_output_size.and_then(|(target_w, _)| {
        let target_w = target_w as f64;
        let eff_w = effective.0 as f64;
        (eff_w < target_w * MAGNIFICATION_WARNING && eff_w > 0.0).then(|| target_w / eff_w)
    });
    Some(ResolutionReport {
        effective,
        target: frame.fixed_output_size,
        magnification,
    })
}
