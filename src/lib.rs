// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. preview::PreviewSession)
    clippy::module_name_repetitions
)]

//! # readme-preview
//!
//! Finds the README files of a workspace and previews them as HTML.
//!
//! - One best README per directory, listed in a flat tree with
//!   lazily-expanded subtrees
//! - A small regex-based Markdown to HTML renderer
//! - A single preview surface that follows the selected README and
//!   refreshes on an interval or on file changes
//!
//! ## Modules
//!
//! - [`discovery`]: README detection, ranking and directory scans
//! - [`tree`]: Tree view model and change notifications
//! - [`markdown`]: Markdown rendering and the preview page
//! - [`preview`]: Preview session, display surfaces and refresh triggers
//! - [`watcher`]: File watching
//! - [`command`]: Commands run by tree items and the host
//! - [`app`]: Command routing and the host loop
//! - [`config`]: Flag files and defaults
//! - [`perf`]: Timing scopes and the debug event log

pub mod app;
pub mod command;
pub mod config;
pub mod discovery;
pub mod markdown;
pub mod perf;
pub mod preview;
pub mod tree;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Command};
    pub use crate::discovery::{DiscoveryOptions, ReadmeFile};
    pub use crate::preview::{DisplaySurface, PreviewSession, SurfaceProvider};
    pub use crate::tree::{TreeItem, TreeModel};
}
