//! Host controller.
//!
//! Owns the tree model, the preview session and the optional tree watcher,
//! and routes [`Command`]s between them:
//! - [`App::dispatch`]: apply one command
//! - [`App::poll`]: advance watchers, refresh triggers and tree listeners
//! - [`App::run`]: command loop until [`Command::Quit`]

pub use crate::command::{Command, CommandParseError};

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::preview::PreviewSession;
use crate::tree::{TreeChange, TreeItem, TreeModel};
use crate::watcher::FileWatcher;

/// Called with the current root items whenever the tree changes.
pub type TreeListener = Box<dyn FnMut(&[TreeItem])>;

/// Default wait between loop iterations when no command arrives.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Whether the command loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    tree: TreeModel,
    tree_changes: Receiver<TreeChange>,
    tree_listener: Option<TreeListener>,
    preview: PreviewSession,
    tree_watcher: Option<FileWatcher>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("tree", &self.tree)
            .field("preview", &self.preview)
            .field("tree_watcher", &self.tree_watcher)
            .field("tree_listener", &self.tree_listener.is_some())
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(mut tree: TreeModel, preview: PreviewSession) -> Self {
        let tree_changes = tree.subscribe();
        Self {
            tree,
            tree_changes,
            tree_listener: None,
            preview,
            tree_watcher: None,
        }
    }

    /// Report the root listing after every tree change.
    pub fn with_tree_listener(mut self, listener: impl FnMut(&[TreeItem]) + 'static) -> Self {
        self.tree_listener = Some(Box::new(listener));
        self
    }

    /// Refresh the tree whenever README files appear, change or disappear.
    pub fn with_tree_watcher(mut self, watcher: FileWatcher) -> Self {
        self.tree_watcher = Some(watcher);
        self
    }

    pub const fn tree(&self) -> &TreeModel {
        &self.tree
    }

    pub const fn tree_mut(&mut self) -> &mut TreeModel {
        &mut self.tree
    }

    pub const fn preview(&self) -> &PreviewSession {
        &self.preview
    }

    pub const fn preview_mut(&mut self) -> &mut PreviewSession {
        &mut self.preview
    }

    /// Apply one command.
    pub fn dispatch(&mut self, command: Command) -> Flow {
        tracing::debug!(?command, "dispatch");
        match command {
            Command::RefreshTree => {
                self.tree.refresh();
                Flow::Continue
            }
            Command::Preview(path) => {
                let file = self.resolve(&path);
                if let Err(err) = self.preview.open_or_focus(&file) {
                    tracing::error!(error = %err, file = %file.display(), "cannot open preview");
                }
                Flow::Continue
            }
            Command::ClosePreview => {
                self.preview.on_closed_by_user();
                Flow::Continue
            }
            Command::Surface(event) => {
                self.preview.handle_surface_event(event);
                Flow::Continue
            }
            Command::Quit => Flow::Quit,
        }
    }

    /// Check the tree watcher, pending tree changes and the preview trigger.
    ///
    /// Returns true if the tree was refreshed or listed, or the preview
    /// re-rendered.
    pub fn poll(&mut self, now: Instant) -> bool {
        let tree_changed = self
            .tree_watcher
            .as_mut()
            .is_some_and(FileWatcher::take_change_ready);
        if tree_changed {
            crate::perf::log_event("tree.watch", "readme change detected");
            self.tree.refresh();
        }
        let listed = self.drain_tree_changes();
        let rendered = self.preview.tick(now);
        tree_changed || listed || rendered
    }

    /// Collapse queued notifications into one listener call.
    fn drain_tree_changes(&mut self) -> bool {
        let pending = self.tree_changes.try_iter().count();
        if pending == 0 {
            return false;
        }
        tracing::debug!(pending, "tree changed");
        if let Some(listener) = self.tree_listener.as_mut() {
            listener(&self.tree.root_items());
        }
        true
    }

    /// Process commands until `Quit` arrives, polling between them.
    ///
    /// A closed command channel does not stop the loop; watchers and the
    /// refresh trigger keep running.
    pub fn run(&mut self, commands: &Receiver<Command>, poll_interval: Duration) {
        let mut connected = true;
        loop {
            if connected {
                match commands.recv_timeout(poll_interval) {
                    Ok(command) => {
                        if self.dispatch(command) == Flow::Quit {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("command channel closed");
                        connected = false;
                    }
                }
            } else {
                std::thread::sleep(poll_interval);
            }
            self.poll(Instant::now());
        }
        self.shutdown();
    }

    /// Release the preview surface.
    pub fn shutdown(&mut self) {
        self.preview.dispose();
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.tree.workspace_root().join(path)
        }
    }
}
