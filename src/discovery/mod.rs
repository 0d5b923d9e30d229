//! README discovery.
//!
//! Walks a workspace looking for files whose name contains "readme" and
//! classifies them per directory:
//! - [`find_best_readme_per_directory`] keeps one README per directory
//! - [`build_subtree`] keeps every README-named file, grouped by directory
//!
//! Unreadable directories are logged and treated as empty so that one bad
//! subtree never hides its siblings.

mod scan;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub use scan::ScanError;
use scan::{EntryKind, walk};

/// Preferred README names, best first. Matching is exact and case-sensitive.
pub const README_PRIORITY: [&str; 5] = [
    "README.md",
    "readme.md",
    "README.markdown",
    "README.txt",
    "README",
];

/// Directory names skipped when no ignore set is configured.
pub const DEFAULT_IGNORED_DIRS: [&str; 2] = ["node_modules", ".git"];

/// A README found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeFile {
    /// Full path to the README
    pub path: PathBuf,
    /// Directory containing the README
    pub directory: PathBuf,
    /// Label shown in listings
    pub label: String,
}

impl ReadmeFile {
    /// File name of the README.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A directory that transitively contains at least one README.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub path: PathBuf,
    /// README-named files directly inside `path`
    pub readmes: Vec<ReadmeFile>,
    /// Subdirectories that contain READMEs somewhere below them
    pub directories: Vec<DirectoryNode>,
}

impl DirectoryNode {
    /// Directory name used as a label.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Total number of READMEs in this node and below.
    pub fn readme_count(&self) -> usize {
        self.readmes.len()
            + self
                .directories
                .iter()
                .map(Self::readme_count)
                .sum::<usize>()
    }
}

/// One entry of a directory's child listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtreeEntry {
    Directory { path: PathBuf, label: String },
    Readme(ReadmeFile),
}

/// Scan settings shared by every discovery entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    ignored_dirs: BTreeSet<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::with_ignored(DEFAULT_IGNORED_DIRS)
    }
}

impl DiscoveryOptions {
    /// Options skipping exactly the given directory names.
    pub fn with_ignored<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_dirs: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a directory with this name is skipped.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_dirs.contains(name)
    }

    pub fn ignored_dirs(&self) -> impl Iterator<Item = &str> {
        self.ignored_dirs.iter().map(String::as_str)
    }
}

/// Returns true if `name` looks like a README (case-insensitive "readme").
pub fn is_readme_name(name: &str) -> bool {
    name.to_lowercase().contains("readme")
}

fn priority_rank(name: &str) -> Option<usize> {
    README_PRIORITY.iter().position(|candidate| *candidate == name)
}

/// Total order over README file names; `Less` means `a` is the better pick.
///
/// Listed names win over unlisted ones and follow [`README_PRIORITY`].
/// Unlisted names compare case-insensitively, falling back to byte order.
pub fn compare_readme_names(a: &str, b: &str) -> Ordering {
    match (priority_rank(a), priority_rank(b)) {
        (Some(rank_a), Some(rank_b)) => rank_a.cmp(&rank_b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

fn root_label(root: &Path, directory: &Path) -> String {
    match directory.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => "README".to_string(),
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => directory.display().to_string(),
    }
}

/// Find the best README of every directory under `root`.
///
/// Keys are directory paths; each value's label is the directory path
/// relative to `root`, or `README` for `root` itself.
pub fn find_best_readme_per_directory(
    root: &Path,
    options: &DiscoveryOptions,
) -> BTreeMap<PathBuf, ReadmeFile> {
    let _scope = crate::perf::scope("discovery.best_per_directory");
    let listing = walk(root, None, options);
    report_errors(&listing.errors);

    let mut best: BTreeMap<PathBuf, ReadmeFile> = BTreeMap::new();
    let mut dirs = 1usize;
    for entry in listing.entries {
        if entry.kind == EntryKind::Directory {
            dirs += 1;
            continue;
        }
        if !is_readme_name(&entry.name) {
            continue;
        }
        let Some(dir) = entry.path.parent().map(Path::to_path_buf) else {
            continue;
        };
        let replace = best.get(&dir).is_none_or(|current| {
            compare_readme_names(&entry.name, &current.file_name()) == Ordering::Less
        });
        if replace {
            let label = root_label(root, &dir);
            best.insert(
                dir.clone(),
                ReadmeFile {
                    path: entry.path,
                    directory: dir,
                    label,
                },
            );
        }
    }

    crate::perf::log_event(
        "discovery.best_per_directory",
        format!(
            "root={} dirs={dirs} errors={} found={}",
            root.display(),
            listing.errors.len(),
            best.len()
        ),
    );
    best
}

/// Build the README subtree rooted at `dir`.
///
/// Unlike [`find_best_readme_per_directory`], every README-named file in a
/// directory is listed. Subdirectories are kept only when something below
/// them qualifies. Returns `None` when `dir` holds no README at any depth or
/// cannot be read.
pub fn build_subtree(dir: &Path, options: &DiscoveryOptions) -> Option<DirectoryNode> {
    let listing = walk(dir, Some(1), options);
    report_errors(&listing.errors);

    let mut readmes = Vec::new();
    let mut directories = Vec::new();
    for entry in listing.entries {
        match entry.kind {
            EntryKind::Directory => {
                if let Some(child) = build_subtree(&entry.path, options) {
                    directories.push(child);
                }
            }
            EntryKind::File if is_readme_name(&entry.name) => readmes.push(ReadmeFile {
                path: entry.path,
                directory: dir.to_path_buf(),
                label: entry.name,
            }),
            EntryKind::File => {}
        }
    }

    if readmes.is_empty() && directories.is_empty() {
        return None;
    }
    Some(DirectoryNode {
        path: dir.to_path_buf(),
        readmes,
        directories,
    })
}

fn report_errors(errors: &[ScanError]) {
    for err in errors {
        tracing::warn!(error = %err, "skipping unreadable path");
        crate::perf::log_event("discovery.error", err.to_string());
    }
}

/// Child listing of `dir` for a tree view: qualifying subdirectories first,
/// then the README-named files, each group in name order.
pub fn list_children(dir: &Path, options: &DiscoveryOptions) -> Vec<SubtreeEntry> {
    let _scope = crate::perf::scope("discovery.list_children");
    let Some(node) = build_subtree(dir, options) else {
        return Vec::new();
    };

    let directories = node.directories.into_iter().map(|child| SubtreeEntry::Directory {
        label: child.name(),
        path: child.path,
    });
    let readmes = node.readmes.into_iter().map(SubtreeEntry::Readme);
    directories.chain(readmes).collect()
}
