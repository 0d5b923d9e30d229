//! Display surface capability injected into the preview session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to open display surface: {0}")]
    Open(String),
    #[error("failed to write preview to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A rendering target able to show one HTML document at a time.
pub trait DisplaySurface {
    fn set_title(&mut self, title: &str);

    /// Replace the displayed document.
    ///
    /// # Errors
    /// Returns an error if the surface could not accept the content.
    fn set_html(&mut self, html: &str) -> Result<(), SurfaceError>;

    /// Bring the surface to the front.
    fn reveal(&mut self);

    fn is_visible(&self) -> bool;

    /// Release the surface. Further calls are ignored.
    fn dispose(&mut self);
}

/// Allocates display surfaces on demand.
pub trait SurfaceProvider {
    /// Open a new surface titled `title`.
    ///
    /// # Errors
    /// Returns an error if the host cannot allocate a surface.
    fn open(&mut self, title: &str) -> Result<Box<dyn DisplaySurface>, SurfaceError>;
}

/// Lifecycle and content events raised by a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Visible,
    Hidden,
    /// Raw JSON posted by the rendered page
    Message(String),
    Closed,
}

/// Messages the preview page can post back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum SurfaceMessage {
    Refresh,
}

impl SurfaceMessage {
    /// Parse a posted message.
    ///
    /// # Errors
    /// Returns an error for malformed JSON or an unknown command.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Surface that writes every document to a file on disk.
#[derive(Debug)]
pub struct HtmlFileSurface {
    output: PathBuf,
    title: String,
    disposed: bool,
}

impl HtmlFileSurface {
    pub fn new(output: impl Into<PathBuf>, title: &str) -> Self {
        Self {
            output: output.into(),
            title: title.to_string(),
            disposed: false,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl DisplaySurface for HtmlFileSurface {
    fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
    }

    fn set_html(&mut self, html: &str) -> Result<(), SurfaceError> {
        if self.disposed {
            return Ok(());
        }
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SurfaceError::Write {
                path: self.output.clone(),
                source,
            })?;
        }
        fs::write(&self.output, html).map_err(|source| SurfaceError::Write {
            path: self.output.clone(),
            source,
        })?;
        tracing::info!(title = %self.title, output = %self.output.display(), bytes = html.len(), "preview written");
        Ok(())
    }

    /// Nothing to bring forward for a file; the page is already on disk.
    fn reveal(&mut self) {
        tracing::debug!(title = %self.title, "preview revealed");
    }

    fn is_visible(&self) -> bool {
        !self.disposed
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Opens [`HtmlFileSurface`]s that all write to the same file.
#[derive(Debug, Clone)]
pub struct FileSurfaceProvider {
    output: PathBuf,
}

impl FileSurfaceProvider {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl SurfaceProvider for FileSurfaceProvider {
    fn open(&mut self, title: &str) -> Result<Box<dyn DisplaySurface>, SurfaceError> {
        Ok(Box::new(HtmlFileSurface::new(self.output.clone(), title)))
    }
}
