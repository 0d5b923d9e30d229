//! README tree model.
//!
//! Wraps discovery results in the item shape a sidebar tree view needs and
//! tells subscribers when the tree has to be queried again.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::command::Command;
use crate::discovery::{
    DiscoveryOptions, ReadmeFile, SubtreeEntry, find_best_readme_per_directory, list_children,
};

/// What a tree item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Readme,
    Directory,
}

/// Initial expansion state reported to the tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapsible {
    /// Leaf, cannot be expanded
    None,
    /// Has children, shown collapsed
    Collapsed,
}

/// One row of the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    /// File name shown next to the label
    pub description: Option<String>,
    pub tooltip: String,
    pub path: PathBuf,
    pub kind: ItemKind,
    pub collapsible: Collapsible,
    /// Command run when the item is activated
    pub command: Option<Command>,
    generation: u64,
}

impl TreeItem {
    fn readme(label: String, path: PathBuf, generation: u64) -> Self {
        let description = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self {
            tooltip: label.clone(),
            label,
            description,
            command: Some(Command::Preview(path.clone())),
            path,
            kind: ItemKind::Readme,
            collapsible: Collapsible::None,
            generation,
        }
    }

    fn directory(label: String, path: PathBuf, generation: u64) -> Self {
        let description = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self {
            tooltip: label.clone(),
            label,
            description,
            path,
            kind: ItemKind::Directory,
            collapsible: Collapsible::Collapsed,
            command: None,
            generation,
        }
    }

    /// Refresh generation this item was produced in.
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Change notification payload. `None` means the whole tree is stale.
pub type TreeChange = Option<TreeItem>;

/// Hierarchical README listing for one workspace root.
pub struct TreeModel {
    root: PathBuf,
    options: DiscoveryOptions,
    best: Vec<ReadmeFile>,
    generation: u64,
    subscribers: Vec<Sender<TreeChange>>,
}

impl std::fmt::Debug for TreeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeModel")
            .field("root", &self.root)
            .field("readmes", &self.best.len())
            .field("generation", &self.generation)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl TreeModel {
    /// Create a model for `root` and run the initial discovery.
    pub fn new(root: impl Into<PathBuf>, options: DiscoveryOptions) -> Self {
        let root = root.into();
        let best = scan_best(&root, &options);
        Self {
            root,
            options,
            best,
            generation: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.root
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the last discovery found no README at all.
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Best README of each directory, sorted by label.
    pub fn root_items(&self) -> Vec<TreeItem> {
        self.best
            .iter()
            .map(|readme| TreeItem::readme(readme.label.clone(), readme.path.clone(), self.generation))
            .collect()
    }

    /// Children of `item`: empty for READMEs and for items from an older
    /// generation, otherwise the directory's qualifying subdirectories and
    /// README files.
    pub fn children(&self, item: &TreeItem) -> Vec<TreeItem> {
        if item.kind == ItemKind::Readme {
            return Vec::new();
        }
        if item.generation != self.generation {
            tracing::debug!(
                path = %item.path.display(),
                item_generation = item.generation,
                generation = self.generation,
                "ignoring children query for stale tree item"
            );
            return Vec::new();
        }
        list_children(&item.path, &self.options)
            .into_iter()
            .map(|entry| match entry {
                SubtreeEntry::Directory { path, label } => {
                    TreeItem::directory(label, path, self.generation)
                }
                SubtreeEntry::Readme(readme) => {
                    TreeItem::readme(readme.label, readme.path, self.generation)
                }
            })
            .collect()
    }

    /// Directory item for `path` in the current generation, for hosts that
    /// expand an arbitrary directory.
    pub fn directory_item(&self, path: &Path) -> TreeItem {
        let label = path
            .strip_prefix(&self.root)
            .ok()
            .filter(|relative| !relative.as_os_str().is_empty())
            .map_or_else(|| path.display().to_string(), |r| r.to_string_lossy().into_owned());
        TreeItem::directory(label, path.to_path_buf(), self.generation)
    }

    /// Re-run discovery and tell every subscriber the tree is stale.
    pub fn refresh(&mut self) {
        let _scope = crate::perf::scope("tree.refresh");
        self.best = scan_best(&self.root, &self.options);
        self.generation += 1;
        tracing::debug!(
            root = %self.root.display(),
            readmes = self.best.len(),
            generation = self.generation,
            "tree refreshed"
        );
        self.notify(None);
    }

    /// Register for change notifications.
    pub fn subscribe(&mut self) -> Receiver<TreeChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send `change` to every live subscriber, dropping closed ones.
    pub fn notify(&mut self, change: TreeChange) {
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}

fn scan_best(root: &Path, options: &DiscoveryOptions) -> Vec<ReadmeFile> {
    let mut best: Vec<ReadmeFile> = find_best_readme_per_directory(root, options)
        .into_values()
        .collect();
    best.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.label.cmp(&b.label))
    });
    best
}
