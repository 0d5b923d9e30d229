//! README preview session.
//!
//! A session is either closed or showing exactly one README on one display
//! surface. Opening another README while open retargets the same surface.
//! Every render re-reads the file, so external edits show up on the next
//! refresh, visibility change or trigger tick.

mod surface;
mod trigger;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::RefreshMode;
use crate::markdown::{file_uri_resolver, panel_title, render, render_error_page, render_page};

pub use surface::{
    DisplaySurface, FileSurfaceProvider, HtmlFileSurface, SurfaceError, SurfaceEvent,
    SurfaceMessage, SurfaceProvider,
};
pub use trigger::{PollingTrigger, RefreshTrigger, WatchTrigger, make_trigger};

/// The README could not be read at render time.
#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct RenderInputError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// What the open surface is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewState {
    pub target: PathBuf,
    pub last_rendered_html: String,
    pub is_visible: bool,
}

/// How an open preview refreshes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub mode: RefreshMode,
    pub interval: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            mode: RefreshMode::Poll,
            interval: crate::config::DEFAULT_REFRESH_INTERVAL,
        }
    }
}

struct ActivePreview {
    state: PreviewState,
    surface: Box<dyn DisplaySurface>,
    trigger: Box<dyn RefreshTrigger>,
}

/// Owner of the single preview surface.
pub struct PreviewSession {
    provider: Box<dyn SurfaceProvider>,
    refresh: RefreshSettings,
    active: Option<ActivePreview>,
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("refresh", &self.refresh)
            .field("target", &self.target())
            .finish_non_exhaustive()
    }
}

impl PreviewSession {
    pub fn new(provider: Box<dyn SurfaceProvider>, refresh: RefreshSettings) -> Self {
        Self {
            provider,
            refresh,
            active: None,
        }
    }

    pub const fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> Option<&PreviewState> {
        self.active.as_ref().map(|active| &active.state)
    }

    pub fn target(&self) -> Option<&Path> {
        self.state().map(|state| state.target.as_path())
    }

    /// Show `file`, opening the surface if needed.
    ///
    /// When already open the existing surface is revealed and retargeted.
    ///
    /// # Errors
    /// Returns an error if a new surface cannot be opened. The session stays
    /// closed in that case.
    pub fn open_or_focus(&mut self, file: &Path) -> Result<(), SurfaceError> {
        let target = std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf());
        let now = Instant::now();

        if let Some(active) = self.active.as_mut() {
            active.surface.reveal();
            active.state.target.clone_from(&target);
            active.trigger.retarget(&target, now);
            tracing::debug!(file = %target.display(), "preview retargeted");
        } else {
            let surface = self.provider.open(&panel_title(&target))?;
            let mut trigger = make_trigger(self.refresh.mode, self.refresh.interval, now);
            trigger.retarget(&target, now);
            tracing::info!(file = %target.display(), "preview opened");
            self.active = Some(ActivePreview {
                state: PreviewState {
                    target,
                    last_rendered_html: String::new(),
                    is_visible: true,
                },
                surface,
                trigger,
            });
        }

        self.render_current();
        Ok(())
    }

    /// The surface became visible again; pick up edits made while hidden.
    pub fn on_became_visible(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.state.is_visible = true;
        }
        self.render_current();
    }

    pub fn on_hidden(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.state.is_visible = false;
        }
    }

    pub fn on_refresh_requested(&mut self) {
        self.render_current();
    }

    /// The user closed the surface: release it and go back to closed.
    pub fn on_closed_by_user(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.surface.dispose();
            tracing::info!(file = %active.state.target.display(), "preview closed");
        }
    }

    /// Route an event raised by the surface.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Visible => self.on_became_visible(),
            SurfaceEvent::Hidden => self.on_hidden(),
            SurfaceEvent::Closed => self.on_closed_by_user(),
            SurfaceEvent::Message(raw) => match SurfaceMessage::parse(&raw) {
                Ok(SurfaceMessage::Refresh) => self.on_refresh_requested(),
                Err(err) => {
                    tracing::debug!(error = %err, message = %raw, "ignoring surface message");
                }
            },
        }
    }

    /// Advance the refresh trigger. Returns true if a render happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = self
            .active
            .as_mut()
            .is_some_and(|active| active.trigger.is_due(now));
        if due {
            crate::perf::log_event("preview.tick", "refresh due");
            self.render_current();
        }
        due
    }

    /// Release the surface on teardown.
    pub fn dispose(&mut self) {
        self.on_closed_by_user();
    }

    fn render_current(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let _scope = crate::perf::scope("preview.render");
        let target = active.state.target.clone();
        let html = render_target(&target);

        active.surface.set_title(&panel_title(&target));
        if let Err(err) = active.surface.set_html(&html) {
            tracing::warn!(error = %err, "failed to update preview surface");
        }
        active.state.last_rendered_html = html;
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn read_target(path: &Path) -> Result<String, RenderInputError> {
    fs::read_to_string(path).map_err(|source| RenderInputError {
        path: path.to_path_buf(),
        source,
    })
}

/// Render the preview page for `target`, or the error page if it cannot be read.
pub fn render_target(target: &Path) -> String {
    match read_target(target) {
        Ok(markdown) => {
            let base_dir = target.parent().unwrap_or_else(|| Path::new("."));
            let body = render(&markdown, file_uri_resolver(base_dir));
            render_page(target, &body)
        }
        Err(err) => {
            tracing::warn!(error = %err, "could not read README");
            crate::perf::log_event("preview.error", err.to_string());
            render_error_page(&err)
        }
    }
}

#[cfg(test)]
mod tests;
