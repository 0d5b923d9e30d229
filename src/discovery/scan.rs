//! Workspace walks shared by every discovery entry point.

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;

use super::DiscoveryOptions;

/// Part of the workspace could not be read.
#[derive(Debug, Error)]
#[error("failed to scan {}: {source}", .path.display())]
pub struct ScanError {
    path: PathBuf,
    #[source]
    source: ignore::Error,
}

impl ScanError {
    fn new(root: &Path, source: ignore::Error) -> Self {
        let path = error_path(&source).map_or_else(|| root.to_path_buf(), Path::to_path_buf);
        Self { path, source }
    }

    /// Path whose listing failed.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub(super) struct ScannedEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Entries found by one walk plus everything that could not be read.
#[derive(Debug, Default)]
pub(super) struct Listing {
    pub entries: Vec<ScannedEntry>,
    pub errors: Vec<ScanError>,
}

/// Walk `root` down to `max_depth` (`None` for unlimited), skipping ignored
/// directory names. Siblings come back sorted by name, case-insensitively
/// and then exactly.
///
/// Links are never followed. A link to a file counts as a file, a link to a
/// directory is dropped. Unreadable directories are reported in
/// [`Listing::errors`] and the walk carries on with their siblings.
pub(super) fn walk(root: &Path, max_depth: Option<usize>, options: &DiscoveryOptions) -> Listing {
    let ignored = options.clone();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .max_depth(max_depth)
        .sort_by_file_name(compare_names)
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_some_and(|kind| kind.is_dir())
                || !ignored.is_ignored(&entry.file_name().to_string_lossy())
        })
        .build();

    let mut listing = Listing::default();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                listing.errors.push(ScanError::new(root, err));
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path().to_path_buf();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file()
            || (file_type.is_symlink() && fs::metadata(&path).is_ok_and(|m| m.is_file()))
        {
            EntryKind::File
        } else {
            continue;
        };
        listing.entries.push(ScannedEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            kind,
        });
    }
    listing
}

fn compare_names(a: &OsStr, b: &OsStr) -> Ordering {
    let (a, b) = (a.to_string_lossy(), b.to_string_lossy());
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}
