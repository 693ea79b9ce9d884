//! Reconciling the in-memory file list with a fresh directory listing.

use std::collections::HashSet;

/// Keep `previous` files still present on `disk` in their old order, then
/// append files that are new on disk, sorted.
///
/// Returns the merged list and the names that were appended.
pub fn merge_listing(previous: &[String], disk: &[String]) -> (Vec<String>, Vec<String>) {
    let on_disk: HashSet<&str> = disk.iter().map(String::as_str).collect();
    let known: HashSet<&str> = previous.iter().map(String::as_str).collect();

    let mut merged: Vec<String> = previous
        .iter()
        .filter(|name| on_disk.contains(name.as_str()))
        .cloned()
        .collect();

    let mut added: Vec<String> = disk
        .iter()
        .filter(|name| !known.contains(name.as_str()))
        .cloned()
        .collect();
    added.sort();
    added.dedup();

    merged.extend(added.iter().cloned());
    (merged, added)
}
