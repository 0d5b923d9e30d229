//! Timing scopes and the debug event log.
//!
//! Scopes report through `tracing` (this module's target) only while timing
//! is switched on. Events are appended to the debug log file when one is
//! open and dropped otherwise.

use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

static TIMING: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: LazyLock<Mutex<Option<DebugLog>>> = LazyLock::new(|| Mutex::new(None));

struct DebugLog {
    opened: Instant,
    out: LineWriter<File>,
}

/// Timing guard returned by [`scope`]. Reports when dropped.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    started: Option<Instant>,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let Some(started) = self.started else { return };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(scope = self.name, elapsed_ms, "timing");
        log_event(self.name, format!("took {elapsed_ms:.2} ms"));
    }
}

/// Turn timing scopes on or off for the whole process.
pub fn set_enabled(enabled: bool) {
    TIMING.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    TIMING.load(Ordering::Relaxed)
}

/// Time the enclosing block. Free when timing is off.
pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        started: is_enabled().then(Instant::now),
    }
}

/// Start writing events to `path`, or close the log when `None`.
///
/// # Errors
/// Returns an error if the log file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let next = match path {
        Some(path) => {
            let mut out = LineWriter::new(File::create(path)?);
            writeln!(out, "# readme-preview events")?;
            Some(DebugLog {
                opened: Instant::now(),
                out,
            })
        }
        None => None,
    };
    *DEBUG_LOG.lock().expect("debug log lock poisoned") = next;
    Ok(())
}

/// Append a named event to the debug log, if one is open.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut guard = DEBUG_LOG.lock().expect("debug log lock poisoned");
    if let Some(log) = guard.as_mut() {
        let at_ms = log.opened.elapsed().as_secs_f64() * 1000.0;
        // Write failures must not disturb the caller.
        let _ = writeln!(log.out, "+{at_ms:.1}ms {name} {}", detail.as_ref());
    }
}
