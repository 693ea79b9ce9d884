//! The four working trees and every move between them.
//!
//! ```text
//! <root>/set_image/[<sub>/]      sources
//! <root>/save_image/[<sub>/]     exports, one `<stem>.jpg` per source
//! <root>/trash_bin/[<sub>/]      discarded sources
//! <root>/trash_bin_save/         discarded exports (shared by all subfolders)
//! ```
//!
//! A source and its export are paired by file stem. Whenever a source moves
//! into or out of the trash, its export moves with it, so an export never
//! sits in `save_image` while its source is in `trash_bin`. Each move is a
//! single `fs::rename`; when the second move of a pair fails the first one
//! is rolled back.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::config::{
    is_supported_image, EXPORT_EXTENSION, OUTPUT_DIR, OUTPUT_TRASH_DIR, SOURCE_DIR,
    SOURCE_TRASH_DIR,
};
use crate::decode::read_dimensions;

/// Errors from filesystem operations on the working trees.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to list {}: {source}", .path.display())]
    List { path: PathBuf, source: io::Error },

    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Failed to delete {}: {source}", .path.display())]
    Delete { path: PathBuf, source: io::Error },

    /// Subfolder names must be one plain path component
    #[error("Invalid subfolder name: {0:?}")]
    InvalidSubfolder(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// An export that travelled along with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedMove {
    pub output: PathBuf,
    pub trash: PathBuf,
}

/// Everything needed to reverse one discard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discarded {
    pub file_name: String,
    pub source: PathBuf,
    pub trash: PathBuf,
    pub export: Option<PairedMove>,
}

/// Result of a multi-file operation. Files are handled one at a time, so a
/// failure part way leaves the earlier files done.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub done: Vec<String>,
    pub failed: Vec<(String, StoreError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One file in the source trash, as shown by the trash browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrashEntry {
    pub name: String,
    pub bytes: u64,
    /// `None` when the header could not be read.
    pub dimensions: Option<(u32, u32)>,
    pub has_export: bool,
}

/// The directory quadruple for one subfolder (or the source root).
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    subfolder: Option<String>,
    source: PathBuf,
    output: PathBuf,
    source_trash: PathBuf,
    output_trash: PathBuf,
}

impl AssetStore {
    /// Resolve the trees for `subfolder` (or the source root) under `root`,
    /// creating any that are missing.
    pub fn open(root: &Path, subfolder: Option<&str>) -> Result<Self, StoreError> {
        if let Some(name) = subfolder {
            validate_subfolder(name)?;
        }
        let nested = |dir: &str| match subfolder {
            Some(name) => root.join(dir).join(name),
            None => root.join(dir),
        };

        let store = Self {
            root: root.to_path_buf(),
            subfolder: subfolder.map(str::to_string),
            source: nested(SOURCE_DIR),
            output: nested(OUTPUT_DIR),
            source_trash: nested(SOURCE_TRASH_DIR),
            output_trash: root.join(OUTPUT_TRASH_DIR),
        };
        for dir in [
            &store.source,
            &store.output,
            &store.source_trash,
            &store.output_trash,
        ] {
            fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subfolder(&self) -> Option<&str> {
        self.subfolder.as_deref()
    }

    pub fn source_dir(&self) -> &Path {
        &self.source
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    pub fn source_trash_dir(&self) -> &Path {
        &self.source_trash
    }

    pub fn output_trash_dir(&self) -> &Path {
        &self.output_trash
    }

    /// Immediate subdirectories of `<root>/set_image`, sorted.
    pub fn list_subfolders(root: &Path) -> Result<Vec<String>, StoreError> {
        let dir = root.join(SOURCE_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = read_names(&dir)?
            .into_iter()
            .filter(|name| dir.join(name).is_dir())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Eligible source images, sorted lexically.
    pub fn list_sources(&self) -> Result<Vec<String>, StoreError> {
        list_images(&self.source)
    }

    /// Eligible images in the source trash, sorted lexically.
    pub fn list_trash(&self) -> Result<Vec<String>, StoreError> {
        list_images(&self.source_trash)
    }

    /// Export file name for a source: its stem plus `.jpg`.
    pub fn export_name(file_name: &str) -> String {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        format!("{stem}.{EXPORT_EXTENSION}")
    }

    pub fn source_path(&self, file_name: &str) -> PathBuf {
        self.source.join(file_name)
    }

    pub fn export_path(&self, file_name: &str) -> PathBuf {
        self.output.join(Self::export_name(file_name))
    }

    pub fn has_export(&self, file_name: &str) -> bool {
        self.export_path(file_name).is_file()
    }

    /// Move a source (and its export, if any) into the trash.
    pub fn discard(&self, file_name: &str) -> Result<Discarded, StoreError> {
        let source = self.source.join(file_name);
        let trash = self.source_trash.join(file_name);
        move_file(&source, &trash)?;

        let export = self.export_path(file_name);
        let paired = if export.is_file() {
            let export_trash = self.output_trash.join(Self::export_name(file_name));
            if let Err(e) = move_file(&export, &export_trash) {
                rollback(&trash, &source);
                return Err(e);
            }
            Some(PairedMove {
                output: export,
                trash: export_trash,
            })
        } else {
            None
        };

        info!(
            "Discarded {} (export moved: {})",
            file_name,
            paired.is_some()
        );
        Ok(Discarded {
            file_name: file_name.to_string(),
            source,
            trash,
            export: paired,
        })
    }

    /// Reverse a [`discard`](Self::discard). The trashed source must still
    /// exist.
    pub fn undo(&self, discarded: &Discarded) -> Result<(), StoreError> {
        if !discarded.trash.is_file() {
            return Err(StoreError::NotFound(discarded.trash.clone()));
        }
        move_file(&discarded.trash, &discarded.source)?;

        if let Some(paired) = &discarded.export {
            if paired.trash.is_file() {
                if let Err(e) = move_file(&paired.trash, &paired.output) {
                    rollback(&discarded.source, &discarded.trash);
                    return Err(e);
                }
            }
        }
        info!("Undid discard of {}", discarded.file_name);
        Ok(())
    }

    /// Move a trashed source (and its trashed export) back.
    pub fn restore(&self, file_name: &str) -> Result<(), StoreError> {
        let trash = self.source_trash.join(file_name);
        if !trash.is_file() {
            return Err(StoreError::NotFound(trash));
        }
        let source = self.source.join(file_name);
        move_file(&trash, &source)?;

        let export_name = Self::export_name(file_name);
        let export_trash = self.output_trash.join(&export_name);
        if export_trash.is_file() {
            if let Err(e) = move_file(&export_trash, &self.output.join(&export_name)) {
                rollback(&source, &trash);
                return Err(e);
            }
        }
        info!("Restored {}", file_name);
        Ok(())
    }

    /// Delete a trashed source and its trashed export for good.
    pub fn purge(&self, file_name: &str) -> Result<(), StoreError> {
        let trash = self.source_trash.join(file_name);
        fs::remove_file(&trash).map_err(|source| StoreError::Delete {
            path: trash.clone(),
            source,
        })?;

        let export_trash = self.output_trash.join(Self::export_name(file_name));
        if export_trash.is_file() {
            fs::remove_file(&export_trash).map_err(|source| StoreError::Delete {
                path: export_trash.clone(),
                source,
            })?;
        }
        info!("Purged {}", file_name);
        Ok(())
    }

    pub fn restore_batch(&self, file_names: &[String]) -> BatchOutcome {
        batch(file_names, |name| self.restore(name))
    }

    pub fn purge_batch(&self, file_names: &[String]) -> BatchOutcome {
        batch(file_names, |name| self.purge(name))
    }

    /// Purge everything currently in the source trash.
    pub fn purge_all(&self) -> Result<BatchOutcome, StoreError> {
        let names = self.list_trash()?;
        Ok(self.purge_batch(&names))
    }

    /// Trash contents with size and pixel dimensions.
    pub fn trash_entries(&self) -> Result<Vec<TrashEntry>, StoreError> {
        let names = self.list_trash()?;
        Ok(names
            .into_iter()
            .map(|name| {
                let path = self.source_trash.join(&name);
                let bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                let dimensions = read_dimensions(&path).ok();
                let has_export = self.output_trash.join(Self::export_name(&name)).is_file();
                TrashEntry {
                    name,
                    bytes,
                    dimensions,
                    has_export,
                }
            })
            .collect())
    }
}

fn validate_subfolder(name: &str) -> Result<(), StoreError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StoreError::InvalidSubfolder(name.to_string())),
    }
}

fn read_names(dir: &Path) -> Result<Vec<String>, StoreError> {
    let list_err = |source| StoreError::List {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        // Non UTF-8 names cannot be paired by stem
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}

fn list_images(dir: &Path) -> Result<Vec<String>, StoreError> {
    let mut names: Vec<String> = read_names(dir)?
        .into_iter()
        .filter(|name| is_supported_image(name) && dir.join(name).is_file())
        .collect();
    names.sort();
    Ok(names)
}

fn move_file(from: &Path, to: &Path) -> Result<(), StoreError> {
    fs::rename(from, to).map_err(|source| {
        warn!("Move {} -> {} failed: {}", from.display(), to.display(), source);
        StoreError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    })
}

fn rollback(from: &Path, to: &Path) {
    if let Err(e) = fs::rename(from, to) {
        warn!(
            "Rollback {} -> {} failed: {}",
            from.display(),
            to.display(),
            e
        );
    }
}

fn batch(file_names: &[String], mut op: impl FnMut(&str) -> Result<(), StoreError>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for name in file_names {
        match op(name) {
            Ok(()) => outcome.done.push(name.clone()),
            Err(e) => outcome.failed.push((name.clone(), e)),
        }
    }
    outcome
}
