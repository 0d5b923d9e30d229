//! Markdown to HTML conversion.
//!
//! This module handles:
//! - Converting README markdown into an HTML fragment with a fixed set of
//!   regex rules
//! - Resolving relative image sources against the README's directory
//! - Wrapping fragments into complete preview pages

mod page;
mod renderer;

use std::path::{Component, Path, PathBuf};

pub use page::{panel_title, render_error_page, render_page};
pub use renderer::{is_remote_source, render};

/// Build the default image resolver for a README located in `base_dir`.
///
/// Relative sources are joined onto `base_dir`, `.` and `..` components are
/// folded lexically (the file does not need to exist), and the result is
/// returned as a `file://` URI.
pub fn file_uri_resolver(base_dir: &Path) -> impl Fn(&str) -> String + '_ {
    move |src: &str| {
        let joined = base_dir.join(src);
        file_uri(&normalize_lexically(&joined))
    }
}

/// Format an absolute path as a `file://` URI.
///
/// Spaces and percent signs are escaped; everything else is kept verbatim.
pub fn file_uri(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            ' ' => escaped.push_str("%20"),
            '%' => escaped.push_str("%25"),
            _ => escaped.push(ch),
        }
    }
    if escaped.starts_with('/') {
        format!("file://{escaped}")
    } else {
        format!("file:///{escaped}")
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
