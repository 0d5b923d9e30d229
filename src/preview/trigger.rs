//! Refresh triggers: a polling timer or a file watcher behind one interface.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::RefreshMode;
use crate::watcher::FileWatcher;

/// Debounce used when the trigger watches the preview target.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Decides when an open preview should re-render on its own.
pub trait RefreshTrigger {
    /// Start tracking `file`; called whenever the preview target changes.
    fn retarget(&mut self, file: &Path, now: Instant);

    /// Returns true when a refresh is due at `now`.
    fn is_due(&mut self, now: Instant) -> bool;
}

/// Fires every `interval`, regardless of file activity.
#[derive(Debug)]
pub struct PollingTrigger {
    interval: Duration,
    last_fired: Instant,
}

impl PollingTrigger {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_fired: now,
        }
    }
}

impl RefreshTrigger for PollingTrigger {
    fn retarget(&mut self, _file: &Path, now: Instant) {
        self.last_fired = now;
    }

    fn is_due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_fired) >= self.interval {
            self.last_fired = now;
            return true;
        }
        false
    }
}

/// Fires after the target file changes on disk.
#[derive(Debug)]
pub struct WatchTrigger {
    debounce: Duration,
    watcher: Option<FileWatcher>,
}

impl WatchTrigger {
    pub const fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            watcher: None,
        }
    }
}

impl RefreshTrigger for WatchTrigger {
    fn retarget(&mut self, file: &Path, _now: Instant) {
        self.watcher = match FileWatcher::for_file(file, self.debounce) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                tracing::warn!(error = %err, path = %file.display(), "watch unavailable");
                crate::perf::log_event(
                    "watcher.error",
                    format!("failed path={} err={err}", file.display()),
                );
                None
            }
        };
    }

    fn is_due(&mut self, _now: Instant) -> bool {
        self.watcher
            .as_mut()
            .is_some_and(FileWatcher::take_change_ready)
    }
}

/// Build the trigger selected by configuration.
pub fn make_trigger(mode: RefreshMode, interval: Duration, now: Instant) -> Box<dyn RefreshTrigger> {
    match mode {
        RefreshMode::Poll => Box::new(PollingTrigger::new(interval, now)),
        RefreshMode::Watch => Box::new(WatchTrigger::new(WATCH_DEBOUNCE)),
    }
}
