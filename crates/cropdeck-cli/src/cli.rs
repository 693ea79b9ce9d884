// ============================================================================
// cropdeck CLI: batch curation without a window
// ============================================================================
//
// Usage examples:
//   cropdeck folders
//   cropdeck --root ~/dataset list --folder cats
//   cropdeck export --ratio 3:2 --skip-existing
//   cropdeck export --ratio 1024x1024 --upscale 4
//   cropdeck trash restore cat_01.png cat_02.png
//
// Every command goes through the same session and store the interactive
// front end uses, so exports, discards and restores follow the same rules.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use cropdeck_core::session::{SaveOutcome, SessionEvent, SessionState};
use cropdeck_core::store::BatchOutcome;
use cropdeck_core::{AssetStore, CropperConfig, InterpolatingUpscaler, SessionController};

/// Longest we wait for one upscaled export.
const EXPORT_WAIT: Duration = Duration::from_secs(600);

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Crop, export and curate an image dataset from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "cropdeck",
    about = "Headless crop exporter and trash manager for image datasets",
    long_about = "Works on a dataset root laid out as set_image/ (sources),\n\
                  save_image/ (exports), trash_bin/ and trash_bin_save/.\n\
                  Subfolders of set_image/ are selected with --folder."
)]
pub struct CliArgs {
    /// Dataset root holding set_image/ and friends.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Subfolder of set_image/ to work in. Defaults to set_image/ itself.
    #[arg(long, global = true, value_name = "NAME")]
    pub folder: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List subfolders of set_image/.
    Folders,

    /// List source images and whether each has an export.
    List,

    /// Fit every image under the frame, center-crop it and export it.
    Export {
        /// Ratio (`16:9`) or fixed output size (`1024x1024`).
        #[arg(long, default_value = "1:1")]
        ratio: String,

        /// Quarter turns clockwise applied before cropping.
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..4))]
        rotate: u8,

        /// Leave images that already have an export alone.
        #[arg(long)]
        skip_existing: bool,

        /// Enlarge magnifying fixed-size exports by this factor first.
        #[arg(long, value_name = "FACTOR", value_parser = clap::value_parser!(u32).range(2..=8))]
        upscale: Option<u32>,
    },

    /// Inspect or manage the trash.
    Trash {
        #[command(subcommand)]
        action: TrashAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum TrashAction {
    /// List trashed sources.
    List,
    /// Move trashed sources (and their exports) back.
    Restore {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete trashed sources (and their exports) for good.
    Purge {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete everything in the trash.
    Empty,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run one command and return an OS exit code.
/// `0` = everything succeeded, `1` = something failed.
pub fn run(args: CliArgs) -> ExitCode {
    match dispatch(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when some items failed but the command ran.
fn dispatch(args: &CliArgs) -> Result<bool> {
    match &args.command {
        Command::Folders => {
            let folders = AssetStore::list_subfolders(&args.root)
                .with_context(|| format!("listing folders under {}", args.root.display()))?;
            println!("[root]");
            for name in folders {
                println!("{name}");
            }
            Ok(true)
        }
        Command::List => {
            let store = AssetStore::open(&args.root, args.folder.as_deref())
                .context("opening dataset")?;
            let files = store.list_sources().context("listing sources")?;
            for (i, name) in files.iter().enumerate() {
                let status = if store.has_export(name) { "saved" } else { "-" };
                println!("{:>5}  {:<5}  {}", i + 1, status, name);
            }
            Ok(true)
        }
        Command::Export {
            ratio,
            rotate,
            skip_existing,
            upscale,
        } => {
            let mut session = open_session(args, *upscale)?;
            session
                .select_ratio(ratio)
                .with_context(|| format!("selecting frame {ratio:?}"))?;
            export_all(&mut session, *rotate, *skip_existing)
        }
        Command::Trash { action } => {
            let mut session = open_session(args, None)?;
            trash(&mut session, action)
        }
    }
}

fn open_session(args: &CliArgs, upscale: Option<u32>) -> Result<SessionController> {
    let mut config = CropperConfig::with_root(&args.root);
    let upscaler = upscale.map(|factor| {
        config.use_upscale = true;
        Arc::new(InterpolatingUpscaler::new(factor)) as cropdeck_core::SharedUpscaler
    });

    let mut session = SessionController::open(config, upscaler)
        .with_context(|| format!("opening dataset at {}", args.root.display()))?;
    if let Some(folder) = &args.folder {
        session
            .select_subfolder(Some(folder))
            .with_context(|| format!("selecting folder {folder:?}"))?;
    }
    Ok(session)
}

// ============================================================================
// Export
// ============================================================================

fn export_all(session: &mut SessionController, rotate: u8, skip_existing: bool) -> Result<bool> {
    let mut seen = HashSet::new();
    let (mut saved, mut skipped, mut failed) = (0usize, 0usize, 0usize);

    while let Some(name) = session.current_file().map(str::to_string) {
        // Past the end the session shows the last picture again
        if !seen.insert(name.clone()) {
            break;
        }

        if skip_existing && session.store().has_export(&name) {
            info!("Skipping {} (already exported)", name);
            skipped += 1;
            session.advance();
            continue;
        }

        for _ in 0..rotate {
            session.rotate();
        }

        match session.save() {
            Ok(SaveOutcome::Saved(path)) => {
                saved += 1;
                println!("{} -> {}", name, path.display());
            }
            Ok(SaveOutcome::Dispatched) => {
                for event in session.wait_for_export(EXPORT_WAIT) {
                    match event {
                        SessionEvent::Saved { file_name, output } => {
                            saved += 1;
                            println!("{} -> {}", file_name, output.display());
                        }
                        SessionEvent::SaveFailed { file_name, message } => {
                            failed += 1;
                            error!("{}: {}", file_name, message);
                            session.advance();
                        }
                        _ => {}
                    }
                }
                if session.state() == SessionState::Saving {
                    error!("Timed out waiting for the export of {}", name);
                    failed += 1;
                    break;
                }
            }
            Ok(SaveOutcome::Skipped) => {
                warn!("{}: crop is empty, nothing written", name);
                skipped += 1;
                session.advance();
            }
            Err(e) => {
                failed += 1;
                error!("{}: {:#}", name, anyhow::Error::from(e));
                session.advance();
            }
        }
    }

    // Drain EndOfList and friends
    session.pump_events();
    info!("Exported {}, skipped {}, failed {}", saved, skipped, failed);
    Ok(failed == 0)
}

// ============================================================================
// Trash
// ============================================================================

fn trash(session: &mut SessionController, action: &TrashAction) -> Result<bool> {
    match action {
        TrashAction::List => {
            for entry in session.trash_entries().context("reading trash")? {
                let dims = entry
                    .dimensions
                    .map(|(w, h)| format!("{w}x{h}"))
                    .unwrap_or_else(|| "?".to_string());
                let export = if entry.has_export { "+export" } else { "" };
                println!(
                    "{:<40} {:>11} {:>8} KB {}",
                    entry.name,
                    dims,
                    entry.bytes / 1024,
                    export
                );
            }
            Ok(true)
        }
        TrashAction::Restore { names } => {
            let outcome = session.restore_from_trash(names).context("restoring")?;
            Ok(report("Restored", outcome))
        }
        TrashAction::Purge { names } => {
            let outcome = session.purge_from_trash(names).context("purging")?;
            Ok(report("Purged", outcome))
        }
        TrashAction::Empty => {
            let outcome = session.empty_trash().context("emptying trash")?;
            Ok(report("Purged", outcome))
        }
    }
}

fn report(verb: &str, outcome: BatchOutcome) -> bool {
    for name in &outcome.done {
        println!("{verb} {name}");
    }
    for (name, e) in &outcome.failed {
        error!("{}: {}", name, e);
    }
    outcome.is_complete()
}
