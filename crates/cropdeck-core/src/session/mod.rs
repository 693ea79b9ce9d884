//! Navigation, saving and reversible deletion over a folder of pictures.
//!
//! # Threading
//!
//! [`SessionController`] is used from one control thread. Exports that go
//! through the upscaler run on a worker thread and report back over a
//! channel; so do idle timeouts. Nothing crosses threads except those
//! messages, and they are applied only inside
//! [`SessionController::pump_events`] and
//! [`SessionController::wait_for_export`].

mod controller;
mod events;
mod export;
mod merge;

pub use controller::{
    SessionController, SessionError, ZoomDirection, PREVIEW_SIZE, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR,
};
pub use events::{
    ControlEvent, DeletionRecord, DirectoryLoad, ExportCompletion, SaveOutcome, SessionEvent,
    SessionState,
};
pub use export::{run_export, ExportError, ExportRequest};
pub use merge::merge_listing;
