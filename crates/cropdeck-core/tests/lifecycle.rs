//! Drives a session through the full keep/discard cycle on a real folder.

use std::fs;
use std::path::Path;

use cropdeck_core::{
    AssetStore, CropperConfig, SaveOutcome, SessionController, SessionEvent, SessionState,
};
use image::{Rgb, RgbImage};
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([200, 40, 90]))
        .save(path)
        .unwrap();
}

fn dataset(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("set_image");
    fs::create_dir_all(&source).unwrap();
    for name in names {
        write_png(&source.join(name), 320, 240);
    }
    dir
}

#[test]
fn test_save_discard_undo_restore() {
    let dir = dataset(&["a.png", "b.png", "c.png"]);
    let root = dir.path();
    let mut session = SessionController::open(CropperConfig::with_root(root), None).unwrap();
    assert_eq!(session.position(), Some((1, 3)));

    // Keep a, which advances to b
    session.select_ratio("16:9").unwrap();
    let SaveOutcome::Saved(out) = session.save().unwrap() else {
        panic!("expected an inline save");
    };
    assert_eq!(out, root.join("save_image/a.jpg"));
    assert_eq!(session.current_file(), Some("b.png"));

    // Discard a together with its export
    session.goto(0);
    assert_eq!(session.discard().unwrap(), "a.png");
    assert!(root.join("trash_bin/a.png").is_file());
    assert!(root.join("trash_bin_save/a.jpg").is_file());
    assert_eq!(session.files(), &["b.png", "c.png"]);

    // Undo brings both back and refocuses a
    assert_eq!(session.undo().unwrap(), "a.png");
    assert_eq!(session.current_file(), Some("a.png"));
    assert!(root.join("save_image/a.jpg").is_file());
    assert!(!root.join("trash_bin_save/a.jpg").exists());

    // Discard c, then restore it through the trash browser
    session.goto(2);
    session.discard().unwrap();
    let entries = session.trash_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "c.png");
    assert_eq!(entries[0].dimensions, Some((320, 240)));
    assert!(!entries[0].has_export);

    let outcome = session
        .restore_from_trash(&["c.png".to_string()])
        .unwrap();
    assert!(outcome.is_complete());
    assert_eq!(session.files(), &["a.png", "b.png", "c.png"]);
    // Restoring clears the undo record along with the reload
    assert!(session.last_deleted().is_none());
}

#[test]
fn test_walk_to_the_end() {
    let dir = dataset(&["a.png", "b.png"]);
    let mut session =
        SessionController::open(CropperConfig::with_root(dir.path()), None).unwrap();

    session.save().unwrap();
    session.save().unwrap();
    assert_eq!(session.current_file(), Some("b.png"));
    assert!(session.pump_events().contains(&SessionEvent::EndOfList));

    let store = session.store();
    assert!(store.has_export("a.png"));
    assert!(store.has_export("b.png"));
    assert_eq!(AssetStore::export_name("b.png"), "b.jpg");

    session.discard().unwrap();
    session.discard().unwrap();
    assert_eq!(session.state(), SessionState::Empty);
    assert_eq!(fs::read_dir(dir.path().join("trash_bin_save")).unwrap().count(), 2);
}

#[test]
fn test_undo_restores_list_and_trees_exactly() {
    let dir = dataset(&["a.png", "b.png", "c.png", "d.png"]);
    let root = dir.path();
    let mut session = SessionController::open(CropperConfig::with_root(root), None).unwrap();

    // Export b, then come back to it
    session.goto(1);
    session.save().unwrap();
    session.goto(1);
    let before = session.files().to_vec();
    let export = root.join("save_image/b.jpg");
    let export_bytes = fs::read(&export).unwrap();

    assert_eq!(session.discard().unwrap(), "b.png");
    assert_eq!(session.files(), &["a.png", "c.png", "d.png"]);

    assert_eq!(session.undo().unwrap(), "b.png");
    assert_eq!(session.files(), before.as_slice());
    assert_eq!(session.index(), 1);
    assert_eq!(session.current_file(), Some("b.png"));
    assert_eq!(fs::read_dir(root.join("trash_bin")).unwrap().count(), 0);
    assert_eq!(fs::read_dir(root.join("trash_bin_save")).unwrap().count(), 0);
    assert_eq!(fs::read(&export).unwrap(), export_bytes);
    assert!(root.join("set_image/b.png").is_file());
}
