//! Session states, records and the messages that cross the control channel.

use std::path::PathBuf;

use serde::Serialize;

use super::export::ExportError;
use crate::store::Discarded;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// No picture is loaded.
    Empty,
    Viewing,
    /// An export is running on the worker; the item stays on screen.
    Saving,
}

/// Outcome of a background export.
#[derive(Debug)]
pub struct ExportCompletion {
    pub file_name: String,
    pub result: Result<PathBuf, ExportError>,
}

/// Messages posted to the control thread by helper threads.
#[derive(Debug)]
pub enum ControlEvent {
    /// The wheel has been quiet for the idle delay.
    IdleTimeout { generation: u64 },
    ExportFinished(ExportCompletion),
}

/// Notifications for the front end, returned by
/// [`SessionController::pump_events`](super::SessionController::pump_events)
/// and by operations that change what is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    /// The canvas needs a (smooth) redraw.
    Redraw,
    Saved { file_name: String, output: PathBuf },
    SaveFailed { file_name: String, message: String },
    /// Advanced past the last item; the last item is shown again.
    EndOfList,
    /// No remaining file could be decoded.
    Exhausted,
}

/// Result of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written synchronously.
    Saved(PathBuf),
    /// Handed to the export worker; completion arrives as an event.
    Dispatched,
    /// The crop rectangle was degenerate. Nothing was written.
    Skipped,
}

/// The single most recent discard, kept for undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRecord {
    /// List position the file was removed from.
    pub index: usize,
    pub discarded: Discarded,
}

impl DeletionRecord {
    pub fn file_name(&self) -> &str {
        &self.discarded.file_name
    }
}

/// Summary of a directory (re)load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryLoad {
    pub total: usize,
    /// Files that were not in the previous listing, in list order.
    pub added: Vec<String>,
    /// Index of the first new file, offered as a jump target.
    pub first_new: Option<usize>,
}
