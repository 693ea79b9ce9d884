//! The cropping session: one list of source files, one current picture.
//!
//! All state lives on the control thread. The two helper threads (the idle
//! timer and the export worker) only ever post [`ControlEvent`]s, which are
//! applied by [`SessionController::pump_events`].

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use image::RgbImage;
use log::{debug, info, warn};
use thiserror::Error;

use super::events::{
    ControlEvent, DeletionRecord, DirectoryLoad, ExportCompletion, SaveOutcome, SessionEvent,
    SessionState,
};
use super::export::{run_export, ExportError, ExportRequest};
use super::merge::merge_listing;
use crate::config::CropperConfig;
use crate::decode::{decode_file, generate_preview, DecodedImage};
use crate::frame::{
    resolution_report, should_consider_upscale, CropFrameResolver, FrameError, ResolutionReport,
};
use crate::geometry::{Point, Size};
use crate::render::{IdleTimer, OverlayStyle, RenderedLayer, TierThresholds, TieredRenderer};
use crate::store::{AssetStore, BatchOutcome, StoreError, TrashEntry};
use crate::transform::{crop_region, Rotation, ViewportTransform};
use crate::upscale::{spawn_export_worker, SharedUpscaler};

/// Zoom factor per wheel step.
pub const ZOOM_IN_FACTOR: f64 = 1.1;
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Longest side of the export preview thumbnail.
pub const PREVIEW_SIZE: u32 = 240;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("A save is already in progress")]
    SaveInFlight,

    #[error("No image is loaded")]
    NoImage,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Failed to start {name} thread: {source}")]
    Thread {
        name: &'static str,
        source: io::Error,
    },
}

/// Wheel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    pub fn factor(self) -> f64 {
        match self {
            ZoomDirection::In => ZOOM_IN_FACTOR,
            ZoomDirection::Out => ZOOM_OUT_FACTOR,
        }
    }
}

/// The picture currently on screen.
#[derive(Debug)]
struct LoadedImage {
    file_name: String,
    /// As decoded, orientation applied.
    original: DecodedImage,
    /// `original` under the viewport's rotation; `None` while unrotated.
    rotated: Option<DecodedImage>,
    viewport: ViewportTransform,
}

impl LoadedImage {
    fn display(&self) -> &DecodedImage {
        self.rotated.as_ref().unwrap_or(&self.original)
    }
}

/// Drives navigation, saving and discarding over one source folder.
pub struct SessionController {
    config: CropperConfig,
    store: AssetStore,
    upscaler: Option<SharedUpscaler>,
    files: Vec<String>,
    index: usize,
    state: SessionState,
    current: Option<LoadedImage>,
    frame: CropFrameResolver,
    renderer: TieredRenderer,
    last_deleted: Option<DeletionRecord>,
    export_preview: Option<DecodedImage>,
    drag_anchor: Option<Point>,
    events_tx: Sender<ControlEvent>,
    events_rx: Receiver<ControlEvent>,
    outbox: Vec<SessionEvent>,
}

impl SessionController {
    /// Open the source root under `config.root` and load its first picture.
    pub fn open(
        config: CropperConfig,
        upscaler: Option<SharedUpscaler>,
    ) -> Result<Self, SessionError> {
        let store = AssetStore::open(&config.root, None)?;
        let (events_tx, events_rx) = unbounded();
        let timer = IdleTimer::new(Duration::from_millis(config.idle_delay_ms), events_tx.clone())
            .map_err(|source| SessionError::Thread {
                name: "idle-timer",
                source,
            })?;
        let renderer = TieredRenderer::new(TierThresholds::from_config(&config), timer);
        let frame = CropFrameResolver::new(canvas_size(&config), config.crop_box_size);

        let mut session = Self {
            config,
            store,
            upscaler,
            files: Vec::new(),
            index: 0,
            state: SessionState::Empty,
            current: None,
            frame,
            renderer,
            last_deleted: None,
            export_preview: None,
            drag_anchor: None,
            events_tx,
            events_rx,
            outbox: Vec::new(),
        };
        session.load_directory(false)?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &CropperConfig {
        &self.config
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn frame(&self) -> &CropFrameResolver {
        &self.frame
    }

    pub fn viewport(&self) -> Option<&ViewportTransform> {
        self.current.as_ref().map(|c| &c.viewport)
    }

    pub fn last_deleted(&self) -> Option<&DeletionRecord> {
        self.last_deleted.as_ref()
    }

    /// Name of the picture on screen.
    pub fn current_file(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.file_name.as_str())
    }

    /// The picture on screen, as displayed (rotation applied).
    pub fn current_image(&self) -> Option<&DecodedImage> {
        self.current.as_ref().map(LoadedImage::display)
    }

    /// One-based position and list length.
    pub fn position(&self) -> Option<(usize, usize)> {
        (!self.files.is_empty()).then(|| (self.index + 1, self.files.len()))
    }

    /// Thumbnail of the current picture's existing export.
    pub fn export_preview(&self) -> Option<&DecodedImage> {
        self.export_preview.as_ref()
    }

    pub fn resolution(&self) -> Option<ResolutionReport> {
        let current = self.current.as_ref()?;
        resolution_report(self.frame.frame(), current.viewport.scale())
    }

    // ------------------------------------------------------------------
    // Directory and navigation
    // ------------------------------------------------------------------

    /// Subfolders of the source root, sorted. The root itself is `None` in
    /// [`select_subfolder`](Self::select_subfolder).
    pub fn subfolders(&self) -> Result<Vec<String>, SessionError> {
        Ok(AssetStore::list_subfolders(&self.config.root)?)
    }

    /// Switch to a subfolder (or the root) and load it afresh.
    pub fn select_subfolder(&mut self, name: Option<&str>) -> Result<DirectoryLoad, SessionError> {
        self.ensure_idle()?;
        self.store = AssetStore::open(&self.config.root, name)?;
        self.files.clear();
        self.current = None;
        info!("Switched to {}", name.unwrap_or("[root]"));
        self.load_directory(false)
    }

    /// Re-read the source folder.
    ///
    /// With `check_changes`, files already listed keep their order and new
    /// files are appended; otherwise the list is the sorted disk listing.
    /// Focus stays on the current file if it still exists. Always clears
    /// the undo record.
    pub fn load_directory(&mut self, check_changes: bool) -> Result<DirectoryLoad, SessionError> {
        self.ensure_idle()?;
        self.last_deleted = None;
        let focus = self.files.get(self.index).cloned();
        let disk = self.store.list_sources()?;

        let (files, added) = if check_changes && !self.files.is_empty() {
            merge_listing(&self.files, &disk)
        } else {
            (disk, Vec::new())
        };
        let first_new = (!added.is_empty()).then(|| files.len() - added.len());

        self.files = files;
        self.index = focus
            .and_then(|name| self.files.iter().position(|f| *f == name))
            .unwrap_or(0);
        info!(
            "Loaded {} files from {} ({} new)",
            self.files.len(),
            self.store.source_dir().display(),
            added.len()
        );
        self.load_current();

        Ok(DirectoryLoad {
            total: self.files.len(),
            added,
            first_new,
        })
    }

    /// Jump to `index`. Ignored while saving or when out of range.
    pub fn goto(&mut self, index: usize) -> bool {
        if self.state == SessionState::Saving || index >= self.files.len() {
            return false;
        }
        self.index = index;
        self.load_current();
        true
    }

    /// Next picture. Past the end the last picture is shown again and
    /// [`SessionEvent::EndOfList`] is emitted.
    pub fn advance(&mut self) -> bool {
        if self.state == SessionState::Saving || self.files.is_empty() {
            return false;
        }
        if self.index + 1 >= self.files.len() {
            self.index = self.files.len() - 1;
            self.outbox.push(SessionEvent::EndOfList);
        } else {
            self.index += 1;
        }
        self.load_current();
        true
    }

    /// Previous picture. No-op on the first.
    pub fn previous(&mut self) -> bool {
        if self.state == SessionState::Saving || self.index == 0 || self.files.is_empty() {
            return false;
        }
        self.index -= 1;
        self.load_current();
        true
    }

    /// Decode `files[index]`, skipping forward past undecodable files.
    fn load_current(&mut self) {
        self.renderer.reset();
        self.drag_anchor = None;
        self.current = None;
        self.export_preview = None;

        if self.files.is_empty() {
            self.index = 0;
            self.state = SessionState::Empty;
            return;
        }
        self.index = self.index.min(self.files.len() - 1);

        while self.index < self.files.len() {
            let name = self.files[self.index].clone();
            match decode_file(&self.store.source_path(&name)) {
                Ok(image) => {
                    debug!("Showing {} ({}x{})", name, image.width, image.height);
                    let viewport = ViewportTransform::fit(image.size(), self.frame.rect())
                        .with_max_scale(self.config.max_scale);
                    self.current = Some(LoadedImage {
                        file_name: name,
                        original: image,
                        rotated: None,
                        viewport,
                    });
                    self.state = SessionState::Viewing;
                    self.refresh_export_preview();
                    return;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    self.index += 1;
                }
            }
        }

        warn!("No decodable pictures left in {}", self.store.source_dir().display());
        self.index = self.files.len() - 1;
        self.state = SessionState::Empty;
        self.outbox.push(SessionEvent::Exhausted);
    }

    fn refresh_export_preview(&mut self) {
        self.export_preview = self.current.as_ref().and_then(|c| {
            let path = self.store.export_path(&c.file_name);
            if !path.is_file() {
                return None;
            }
            decode_file(&path)
                .and_then(|export| generate_preview(&export, PREVIEW_SIZE, PREVIEW_SIZE))
                .map_err(|e| debug!("No preview for {}: {}", path.display(), e))
                .ok()
        });
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Saving {
            Err(SessionError::SaveInFlight)
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Save, discard, undo
    // ------------------------------------------------------------------

    /// Export the framed region of the current picture.
    ///
    /// Exports that would magnify to a locked size go through the upscaler
    /// on a worker thread when it is enabled and ready; their completion
    /// arrives through [`pump_events`](Self::pump_events). Everything else
    /// is written before this returns. Either way a successful save
    /// advances to the next picture.
    pub fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        self.ensure_idle()?;
        let current = self.current.as_ref().ok_or(SessionError::NoImage)?;

        let rect = current.viewport.source_rect();
        let Some(crop) = crop_region(current.display(), rect) else {
            warn!("Degenerate crop {:?} for {}; nothing saved", rect, current.file_name);
            return Ok(SaveOutcome::Skipped);
        };

        let target = self.frame.fixed_output_size();
        let request = ExportRequest {
            file_name: current.file_name.clone(),
            crop,
            target,
            output: self.store.export_path(&current.file_name),
            quality: self.config.export_quality,
        };

        let magnifies = should_consider_upscale(self.frame.frame().size(), current.viewport.scale(), target);
        let upscaler = self
            .upscaler
            .as_ref()
            .filter(|u| magnifies && self.config.use_upscale && u.ready())
            .cloned();

        if let Some(upscaler) = upscaler {
            info!("Dispatching {} to the export worker", request.file_name);
            spawn_export_worker(request, Some(upscaler), self.events_tx.clone()).map_err(
                |source| SessionError::Thread {
                    name: "export-worker",
                    source,
                },
            )?;
            self.state = SessionState::Saving;
            return Ok(SaveOutcome::Dispatched);
        }

        let file_name = request.file_name.clone();
        let output = run_export(request, None).map_err(|e| {
            warn!("Saving {} failed: {}", file_name, e);
            e
        })?;
        self.advance();
        Ok(SaveOutcome::Saved(output))
    }

    /// Move the current source (and its export) to the trash.
    pub fn discard(&mut self) -> Result<String, SessionError> {
        self.ensure_idle()?;
        let name = self.files.get(self.index).cloned().ok_or(SessionError::NoImage)?;
        let discarded = self.store.discard(&name)?;

        let index = self.index;
        self.files.remove(index);
        self.last_deleted = Some(DeletionRecord { index, discarded });
        if self.index >= self.files.len() {
            self.index = 0;
        }
        self.load_current();
        Ok(name)
    }

    /// Bring back the most recent discard and select it.
    pub fn undo(&mut self) -> Result<String, SessionError> {
        self.ensure_idle()?;
        let record = self.last_deleted.take().ok_or(SessionError::NothingToUndo)?;

        match self.store.undo(&record.discarded) {
            Ok(()) => {}
            Err(e @ StoreError::NotFound(_)) => return Err(e.into()),
            Err(e) => {
                self.last_deleted = Some(record);
                return Err(e.into());
            }
        }

        let name = record.discarded.file_name;
        let index = record.index.min(self.files.len());
        self.files.insert(index, name.clone());
        self.index = index;
        self.load_current();
        Ok(name)
    }

    // ------------------------------------------------------------------
    // Frame and view controls
    // ------------------------------------------------------------------

    /// Turn the picture a quarter turn clockwise and fit it again.
    pub fn rotate(&mut self) -> bool {
        if self.state != SessionState::Viewing {
            return false;
        }
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        current.viewport.rotate();
        let rotation = current.viewport.rotation();
        current.rotated = (rotation != Rotation::NONE).then(|| rotation.apply(&current.original));
        self.renderer.reset();
        true
    }

    /// Select a ratio preset, a typed ratio or a fixed size. On a parse
    /// error the previous selection stays.
    pub fn select_ratio(&mut self, token: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.frame.select(token)?;
        self.retarget();
        Ok(())
    }

    /// Resize the frame by hand. Ignored while saving.
    pub fn nudge_frame(&mut self, dw: f64, dh: f64) -> bool {
        if self.state == SessionState::Saving {
            return false;
        }
        self.frame.nudge(dw, dh);
        self.retarget();
        true
    }

    /// Recenter the frame on a resized canvas. Ignored while saving.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> bool {
        if self.state == SessionState::Saving {
            return false;
        }
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self.frame.set_canvas_size(canvas_size(&self.config));
        self.retarget();
        true
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.config.show_grid = show;
    }

    pub fn set_upscale_enabled(&mut self, enabled: bool) {
        self.config.use_upscale = enabled;
    }

    fn retarget(&mut self) {
        let rect = self.frame.rect();
        if let Some(current) = self.current.as_mut() {
            current.viewport.retarget(rect);
        }
    }

    // ------------------------------------------------------------------
    // Pointer interaction
    // ------------------------------------------------------------------

    pub fn begin_drag(&mut self, at: Point) {
        if self.state != SessionState::Viewing {
            return;
        }
        self.drag_anchor = Some(at);
        self.renderer.begin_gesture();
    }

    pub fn drag_to(&mut self, at: Point) {
        if self.state != SessionState::Viewing {
            return;
        }
        let (Some(anchor), Some(current)) = (self.drag_anchor, self.current.as_mut()) else {
            return;
        };
        current.viewport.pan(at.x - anchor.x, at.y - anchor.y);
        self.drag_anchor = Some(at);
    }

    /// Returns `true` if a final smooth render is due.
    pub fn end_drag(&mut self) -> bool {
        self.drag_anchor = None;
        self.renderer.end_gesture()
    }

    /// Zoom one wheel step about `at`.
    pub fn wheel(&mut self, at: Point, direction: ZoomDirection) {
        if self.state != SessionState::Viewing {
            return;
        }
        let Some(current) = self.current.as_mut() else {
            return;
        };
        current.viewport.zoom(direction.factor(), at);
        self.renderer.wheel();
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// The picture layer at the current quality tier.
    pub fn render(&mut self) -> Option<RenderedLayer> {
        let canvas = canvas_size(&self.config);
        let current = self.current.as_ref()?;
        self.renderer
            .render(current.display(), &current.viewport.state(), canvas)
    }

    /// The full canvas: background, picture and overlay.
    pub fn compose(&mut self) -> RgbImage {
        let canvas = (self.config.canvas_width, self.config.canvas_height);
        let style = OverlayStyle {
            mask_opacity: self.config.mask_opacity,
            show_grid: self.config.show_grid,
        };
        let state = self.current.as_ref().map(|c| c.viewport.state());
        let image = self
            .current
            .as_ref()
            .zip(state.as_ref())
            .map(|(c, s)| (c.display(), s));
        self.renderer.compose(image, canvas, self.frame.rect(), style)
    }

    // ------------------------------------------------------------------
    // Control channel
    // ------------------------------------------------------------------

    /// Apply everything posted by helper threads and return the events
    /// produced since the last call.
    pub fn pump_events(&mut self) -> Vec<SessionEvent> {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_control(event);
        }
        std::mem::take(&mut self.outbox)
    }

    /// Block until a running export finishes or `timeout` passes, then
    /// pump. The export itself is never cancelled.
    pub fn wait_for_export(&mut self, timeout: Duration) -> Vec<SessionEvent> {
        let deadline = Instant::now() + timeout;
        while self.state == SessionState::Saving {
            match self.events_rx.recv_deadline(deadline) {
                Ok(event) => self.handle_control(event),
                Err(_) => break,
            }
        }
        self.pump_events()
    }

    fn handle_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::IdleTimeout { generation } => {
                if self.renderer.idle_timeout(generation) {
                    self.outbox.push(SessionEvent::Redraw);
                }
            }
            ControlEvent::ExportFinished(completion) => self.finish_export(completion),
        }
    }

    fn finish_export(&mut self, completion: ExportCompletion) {
        if self.state != SessionState::Saving {
            warn!("Unexpected export completion for {}", completion.file_name);
            return;
        }
        self.state = if self.current.is_some() {
            SessionState::Viewing
        } else {
            SessionState::Empty
        };

        match completion.result {
            Ok(output) => {
                self.outbox.push(SessionEvent::Saved {
                    file_name: completion.file_name,
                    output,
                });
                self.advance();
            }
            Err(e) => {
                warn!("Saving {} failed: {}", completion.file_name, e);
                self.outbox.push(SessionEvent::SaveFailed {
                    file_name: completion.file_name,
                    message: e.to_string(),
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Trash browser
    // ------------------------------------------------------------------

    pub fn trash_entries(&self) -> Result<Vec<TrashEntry>, SessionError> {
        Ok(self.store.trash_entries()?)
    }

    /// Restore files from the trash and reload, keeping focus.
    pub fn restore_from_trash(&mut self, names: &[String]) -> Result<BatchOutcome, SessionError> {
        self.ensure_idle()?;
        let outcome = self.store.restore_batch(names);
        if !outcome.done.is_empty() {
            self.load_directory(false)?;
        }
        Ok(outcome)
    }

    pub fn purge_from_trash(&mut self, names: &[String]) -> Result<BatchOutcome, SessionError> {
        self.ensure_idle()?;
        Ok(self.store.purge_batch(names))
    }

    pub fn empty_trash(&mut self) -> Result<BatchOutcome, SessionError> {
        self.ensure_idle()?;
        Ok(self.store.purge_all()?)
    }

    /// Path the current picture exports to.
    pub fn current_export_path(&self) -> Option<PathBuf> {
        self.current_file().map(|name| self.store.export_path(name))
    }
}

fn canvas_size(config: &CropperConfig) -> Size {
    Size::from_pixels(config.canvas_width, config.canvas_height)
}
