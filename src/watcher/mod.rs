//! Debounced `notify` watchers.
//!
//! One watcher follows the previewed README; another follows README files
//! across the whole workspace so the tree can refresh itself.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::event::{CreateKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::discovery::{DiscoveryOptions, is_readme_name};

#[derive(Debug)]
enum WatchFilter {
    /// Events touching one file (or its directory, for backends that only
    /// report the parent)
    File {
        target_path: PathBuf,
        target_name: Option<OsString>,
    },
    /// Events touching README-named files anywhere below the root
    Readmes { options: DiscoveryOptions },
}

/// Emits debounced change notifications for a file or a README tree.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    filter: WatchFilter,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watch_root", &self.watch_root)
            .field("filter", &self.filter)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Create a watcher for a single file.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn for_file(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Backends report canonical paths.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);
        let filter = WatchFilter::File {
            target_path,
            target_name,
        };
        Self::start(watch_root, RecursiveMode::NonRecursive, filter, debounce)
    }

    /// Create a recursive watcher reporting README creation, deletion and
    /// modification below `root`. Paths inside ignored directories are skipped.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the root cannot be watched.
    pub fn for_readmes(
        root: impl AsRef<Path>,
        options: DiscoveryOptions,
        debounce: Duration,
    ) -> notify::Result<Self> {
        let watch_root = root
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| root.as_ref().to_path_buf());
        let filter = WatchFilter::Readmes { options };
        Self::start(watch_root, RecursiveMode::Recursive, filter, debounce)
    }

    fn start(
        watch_root: PathBuf,
        mode: RecursiveMode,
        filter: WatchFilter,
        debounce: Duration,
    ) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, mode)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            filter,
            debounce,
            pending_since: None,
        })
    }

    /// The canonical path of the watched file, if this is a file watcher.
    pub fn target_path(&self) -> Option<&Path> {
        match &self.filter {
            WatchFilter::File { target_path, .. } => Some(target_path),
            WatchFilter::Readmes { .. } => None,
        }
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    /// Drain pending events and report whether a change has settled.
    ///
    /// A relevant event restarts the debounce window; `true` is returned
    /// once the window has passed without further relevant events.
    pub fn take_change_ready(&mut self) -> bool {
        let mut drained = 0usize;
        let mut relevant = 0usize;
        while let Ok(received) = self.rx.try_recv() {
            drained += 1;
            match received {
                Ok(event) if self.is_relevant(&event) => relevant += 1,
                Ok(event) => crate::perf::log_event(
                    "watcher.skip",
                    format!("{:?} {:?}", event.kind, event.paths),
                ),
                Err(err) => {
                    tracing::warn!(error = %err, root = %self.watch_root.display(), "watch error");
                    crate::perf::log_event("watcher.error", err.to_string());
                }
            }
        }

        if drained > 0 {
            crate::perf::log_event(
                "watcher.drain",
                format!("events={drained} relevant={relevant} root={}", self.watch_root.display()),
            );
        }
        if relevant > 0 {
            self.pending_since = Some(Instant::now());
        }

        match self.pending_since {
            Some(since) if since.elapsed() >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        match &self.filter {
            WatchFilter::File {
                target_path,
                target_name,
            } => event.paths.iter().any(|path| {
                path == &self.watch_root
                    || path == target_path
                    || target_name
                        .as_ref()
                        .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
            }),
            WatchFilter::Readmes { options } => {
                let folder_change = matches!(
                    event.kind,
                    EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder)
                );
                event.paths.iter().any(|path| {
                    !self.is_inside_ignored(path, options)
                        && (folder_change
                            || path
                                .file_name()
                                .is_some_and(|name| is_readme_name(&name.to_string_lossy())))
                })
            }
        }
    }

    fn is_inside_ignored(&self, path: &Path, options: &DiscoveryOptions) -> bool {
        path.strip_prefix(&self.watch_root)
            .unwrap_or(path)
            .components()
            .any(|component| options.is_ignored(&component.as_os_str().to_string_lossy()))
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
