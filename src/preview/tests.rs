use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tempfile::tempdir;

use super::*;

#[derive(Debug, Default)]
struct SurfaceLog {
    opened: usize,
    titles: Vec<String>,
    html: Vec<String>,
    reveals: usize,
    disposed: usize,
}

struct RecordingSurface {
    log: Rc<RefCell<SurfaceLog>>,
}

impl DisplaySurface for RecordingSurface {
    fn set_title(&mut self, title: &str) {
        self.log.borrow_mut().titles.push(title.to_string());
    }

    fn set_html(&mut self, html: &str) -> Result<(), SurfaceError> {
        self.log.borrow_mut().html.push(html.to_string());
        Ok(())
    }

    fn reveal(&mut self) {
        self.log.borrow_mut().reveals += 1;
    }

    fn is_visible(&self) -> bool {
        true
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed += 1;
    }
}

struct RecordingProvider {
    log: Rc<RefCell<SurfaceLog>>,
}

impl SurfaceProvider for RecordingProvider {
    fn open(&mut self, title: &str) -> Result<Box<dyn DisplaySurface>, SurfaceError> {
        let mut log = self.log.borrow_mut();
        log.opened += 1;
        log.titles.push(title.to_string());
        Ok(Box::new(RecordingSurface {
            log: Rc::clone(&self.log),
        }))
    }
}

struct FailingProvider;

impl SurfaceProvider for FailingProvider {
    fn open(&mut self, _title: &str) -> Result<Box<dyn DisplaySurface>, SurfaceError> {
        Err(SurfaceError::Open("no display".to_string()))
    }
}

fn create_session(interval: Duration) -> (PreviewSession, Rc<RefCell<SurfaceLog>>) {
    let log = Rc::new(RefCell::new(SurfaceLog::default()));
    let provider = RecordingProvider {
        log: Rc::clone(&log),
    };
    let settings = RefreshSettings {
        mode: RefreshMode::Poll,
        interval,
    };
    (PreviewSession::new(Box::new(provider), settings), log)
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_open_renders_and_enters_open_state() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("README.md");
    write(&readme, "# Hello\n\n**world**");
    let (mut session, log) = create_session(Duration::from_secs(10));

    assert!(!session.is_open());
    session.open_or_focus(&readme).unwrap();

    assert!(session.is_open());
    let state = session.state().unwrap();
    assert_eq!(state.target, readme);
    assert!(state.is_visible);
    assert!(state.last_rendered_html.contains("<h1>Hello</h1>"));
    assert!(state.last_rendered_html.contains("<strong>world</strong>"));

    let log = log.borrow();
    assert_eq!(log.opened, 1);
    assert_eq!(log.html.len(), 1);
    assert_eq!(log.titles.last().unwrap(), "README Preview - README.md");
}

#[test]
fn test_second_open_retargets_same_surface() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("README.md");
    let second = dir.path().join("docs").join("README.txt");
    write(&first, "first");
    write(&second, "second");
    let (mut session, log) = create_session(Duration::from_secs(10));

    session.open_or_focus(&first).unwrap();
    session.open_or_focus(&second).unwrap();

    assert_eq!(session.target(), Some(second.as_path()));
    let log = log.borrow();
    assert_eq!(log.opened, 1, "only one surface may exist");
    assert_eq!(log.reveals, 1);
    assert_eq!(log.html.len(), 2);
    assert!(log.html[1].contains("second"));
    assert_eq!(log.titles.last().unwrap(), "README Preview - README.txt");
}

#[test]
fn test_refresh_picks_up_external_edit() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("README.md");
    write(&readme, "before");
    let (mut session, _log) = create_session(Duration::from_secs(10));
    session.open_or_focus(&readme).unwrap();

    write(&readme, "after");
    session.on_refresh_requested();

    let html = &session.state().unwrap().last_rendered_html;
    assert!(html.contains("after"));
    assert!(!html.contains("before"));
}

#[test]
fn test_visibility_events_update_state_and_render() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("README.md");
    write(&readme, "v1");
    let (mut session, log) = create_session(Duration::from_secs(10));
    session.open_or_focus(&readme).unwrap();

    session.handle_surface_event(SurfaceEvent::Hidden);
    assert!(!session.state().unwrap().is_visible);

    write(&readme, "v2");
    session.handle_surface_event(SurfaceEvent::Visible);
    assert!(session.state().unwrap().is_visible);
    assert!(session.state().unwrap().last_rendered_html.contains("v2"));
    assert_eq!(log.borrow().html.len(), 2);
}

#[test]
fn test_refresh_message_from_surface_renders() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("README.md");
    write(&readme, "text");
    let (mut session, log) = create_session(Duration::from_secs(10));
    session.open_or_focus(&readme).unwrap();

    session.handle_surface_event(SurfaceEvent::Message(r#"{"command":"refresh"}"#.to_string()));
    session.handle_surface_event(SurfaceEvent::Message(r#"{"command":"zoom"}"#.to_string()));

    assert_eq!(log.borrow().html.len(), 2);
}

#[test]
fn test_unreadable_target_renders_error_page_and_stays_open() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("README.md");
    let (mut session, _log) = create_session(Duration::from_secs(10));

    session.open_or_focus(&missing).unwrap();

    assert!(session.is_open());
    let html = &session.state().unwrap().last_rendered_html;
    assert!(html.contains("Error loading README"));
    assert!(html.contains("Could not read the README file:"));
}

#[test]
fn test_close_releases_surface() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("README.md");
    write(&readme, "x");
    let (mut session, log) = create_session(Duration::from_secs(10));
    session.open_or_focus(&readme).unwrap();

    session.handle_surface_event(SurfaceEvent::Closed);

    assert!(!session.is_open());
    assert!(session.state().is_none());
    assert_eq!(log.borrow().disposed, 1);

    session.on_refresh_requested();
    assert_eq!(log.borrow().html.len(), 1, "closed sessions do not render");

    session.open_or_focus(&readme).unwrap();
    assert_eq!(log.borrow().opened, 2, "reopening allocates a new surface");
}

#[test]
fn test_drop_disposes_open_surface() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("README.md");
    write(&readme, "x");
    let (mut session, log) = create_session(Duration::from_secs(10));
    session.open_or_focus(&readme).unwrap();

    drop(session);
    assert_eq!(log.borrow().disposed, 1);
}

#[test]
fn test_tick_renders_only_when_interval_elapsed() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("README.md");
    write(&readme, "x");
    let (mut session, log) = create_session(Duration::from_secs(10));
    session.open_or_focus(&readme).unwrap();
    let now = Instant::now();

    assert!(!session.tick(now));
    assert!(session.tick(now + Duration::from_secs(11)));
    assert_eq!(log.borrow().html.len(), 2);
}

#[test]
fn test_tick_while_closed_does_nothing() {
    let (mut session, log) = create_session(Duration::from_millis(1));
    assert!(!session.tick(Instant::now() + Duration::from_secs(60)));
    assert!(log.borrow().html.is_empty());
}

#[test]
fn test_failed_open_keeps_session_closed() {
    let mut session = PreviewSession::new(Box::new(FailingProvider), RefreshSettings::default());
    let err = session.open_or_focus(Path::new("README.md")).unwrap_err();
    assert!(err.to_string().contains("no display"));
    assert!(!session.is_open());
}

#[test]
fn test_relative_images_resolve_against_readme_directory() {
    let dir = tempdir().unwrap();
    let readme = dir.path().join("docs").join("README.md");
    write(&readme, "![diagram](img/flow.png)");

    let html = render_target(&readme);
    let expected = crate::markdown::file_uri(&dir.path().join("docs").join("img").join("flow.png"));
    assert!(html.contains(&format!(r#"<img alt="diagram" src="{expected}">"#)));
}
