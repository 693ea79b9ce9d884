//! Cropdeck Core - crop viewport engine and asset lifecycle
//!
//! This crate provides the core of the cropdeck dataset curator: the
//! pan/zoom/rotate math that keeps a crop frame covered by picture content,
//! tiered and culled rendering of the canvas, and the session that walks a
//! folder of source images while keeping exports and the two trash trees
//! consistent across save, discard and undo.

pub mod config;
pub mod decode;
pub mod encode;
pub mod frame;
pub mod geometry;
pub mod render;
pub mod session;
pub mod store;
pub mod transform;
pub mod upscale;

pub use config::CropperConfig;
pub use decode::{DecodeError, DecodedImage};
pub use frame::{parse_frame_request, CropFrame, CropFrameResolver, FrameError, FrameRequest};
pub use geometry::{Point, Rect, Size};
pub use render::{QualityTier, TieredRenderer};
pub use session::{
    SaveOutcome, SessionController, SessionError, SessionEvent, SessionState, ZoomDirection,
};
pub use store::{AssetStore, BatchOutcome, StoreError, TrashEntry};
pub use transform::{Rotation, ViewportState, ViewportTransform};
pub use upscale::{InterpolatingUpscaler, SharedUpscaler, Upscaler};
