use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::discovery::{DEFAULT_IGNORED_DIRS, DiscoveryOptions};

/// Interval of the polling refresh fallback.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// How an open preview notices file changes.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Re-render on a fixed interval
    Poll,
    /// Re-render when the file changes on disk
    Watch,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub ignore: Vec<String>,
    pub refresh_mode: Option<RefreshMode>,
    pub refresh_interval: Option<u64>,
    pub perf: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        let mut ignore = self.ignore.clone();
        for name in &other.ignore {
            if !ignore.contains(name) {
                ignore.push(name.clone());
            }
        }
        Self {
            ignore,
            refresh_mode: other.refresh_mode.or(self.refresh_mode),
            refresh_interval: other.refresh_interval.or(self.refresh_interval),
            perf: self.perf || other.perf,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }

    /// Discovery settings: the configured ignore list, or the defaults when
    /// none is configured.
    pub fn discovery_options(&self) -> DiscoveryOptions {
        if self.ignore.is_empty() {
            DiscoveryOptions::with_ignored(DEFAULT_IGNORED_DIRS)
        } else {
            DiscoveryOptions::with_ignored(self.ignore.iter().cloned())
        }
    }

    pub fn effective_refresh_mode(&self) -> RefreshMode {
        self.refresh_mode.unwrap_or(RefreshMode::Poll)
    }

    /// Polling interval; zero is treated as unset.
    pub fn effective_refresh_interval(&self) -> Duration {
        self.refresh_interval
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_REFRESH_INTERVAL, Duration::from_secs)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("readme-preview").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("readme-preview")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("readme-preview").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("readme-preview")
                .join("config");
        }
    }

    PathBuf::from(".readmepreviewrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".readmepreviewrc")
}

/// Read flag tokens from a config file. A missing file yields defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` as a config file, one flag per line.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# readme-preview defaults (saved with --save)".to_string());
    for name in &flags.ignore {
        lines.push(format!("--ignore {name}"));
    }
    if let Some(mode) = flags.refresh_mode {
        let mode_str = match mode {
            RefreshMode::Poll => "poll",
            RefreshMode::Watch => "watch",
        };
        lines.push(format!("--refresh-mode {mode_str}"));
    }
    if let Some(secs) = flags.refresh_interval {
        lines.push(format!("--refresh-interval {secs}"));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove a saved config file if present.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the flags this module knows out of a raw argument list.
///
/// Unknown tokens (subcommands, positional paths, `--save`) are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--perf" {
            flags.perf = true;
        } else if token == "--ignore" {
            if let Some(next) = tokens.get(i + 1) {
                push_unique(&mut flags.ignore, next);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--ignore=") {
            push_unique(&mut flags.ignore, value);
        } else if token == "--refresh-mode" {
            if let Some(next) = tokens.get(i + 1) {
                flags.refresh_mode = parse_refresh_mode(next);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--refresh-mode=") {
            flags.refresh_mode = parse_refresh_mode(value);
        } else if token == "--refresh-interval" {
            if let Some(next) = tokens.get(i + 1) {
                flags.refresh_interval = next.parse().ok();
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--refresh-interval=") {
            flags.refresh_interval = value.parse().ok();
        } else if token == "--debug-log" {
            if let Some(next) = tokens.get(i + 1) {
                flags.debug_log = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--debug-log=") {
            flags.debug_log = Some(PathBuf::from(value));
        }
        i += 1;
    }
    flags
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

fn parse_refresh_mode(s: &str) -> Option<RefreshMode> {
    match s {
        "poll" => Some(RefreshMode::Poll),
        "watch" => Some(RefreshMode::Watch),
        _ => None,
    }
}
