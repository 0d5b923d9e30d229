//! readme-preview - find README files and preview them as HTML.
//!
//! # Usage
//!
//! ```bash
//! readme-preview tree .
//! readme-preview render docs/README.md -o preview.html
//! readme-preview watch . --output preview.html README.md
//! ```

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use readme_preview::app::{App, Command, DEFAULT_POLL_INTERVAL};
use readme_preview::config::{
    ConfigFlags, RefreshMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, save_config_flags,
};
use readme_preview::discovery::{DirectoryNode, DiscoveryOptions, build_subtree};
use readme_preview::perf;
use readme_preview::preview::{FileSurfaceProvider, PreviewSession, RefreshSettings, render_target};
use readme_preview::tree::{TreeItem, TreeModel};
use readme_preview::watcher::FileWatcher;

const TREE_WATCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Discover README files in a workspace and preview them as HTML
#[derive(Parser, Debug)]
#[command(name = "readme-preview", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    /// Skip directories with this name (repeatable)
    #[arg(long, value_name = "NAME", global = true)]
    ignore: Vec<String>,

    /// How an open preview picks up file changes
    #[arg(long, value_enum, global = true)]
    refresh_mode: Option<RefreshMode>,

    /// Seconds between refreshes in poll mode
    #[arg(long, value_name = "SECS", global = true)]
    refresh_interval: Option<u64>,

    /// Enable performance timing output
    #[arg(long, global = true)]
    perf: bool,

    /// Write detailed debug events to a file
    #[arg(long, value_name = "PATH", global = true)]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the best README of each directory and the full README subtree
    Tree {
        /// Workspace root
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,
    },
    /// Render one README to a standalone HTML page
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the page here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
    /// Keep a preview page up to date, reading commands from stdin
    Watch {
        /// Workspace root
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,

        /// HTML file the preview is written to
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,

        /// README to open at startup
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            ignore: self.ignore.clone(),
            refresh_mode: self.refresh_mode,
            refresh_interval: self.refresh_interval,
            perf: self.perf,
            debug_log: self.debug_log.clone(),
        }
    }
}

fn init_logging(perf_enabled: bool) -> Result<()> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if perf_enabled {
        filter = filter.add_directive(
            "readme_preview::perf=info"
                .parse()
                .context("Invalid perf log directive")?,
        );
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn print_tree(root: &Path, options: DiscoveryOptions) -> Result<()> {
    let subtree = build_subtree(root, &options);
    let model = TreeModel::new(root, options);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if model.is_empty() {
        writeln!(out, "No README files found in {}", root.display())?;
        return Ok(());
    }
    for item in model.root_items() {
        writeln!(out, "{}  {}", item.label, item.path.display())?;
    }
    if let Some(node) = subtree {
        writeln!(out)?;
        print_node(&mut out, &node, 0)?;
    }
    Ok(())
}

fn print_node(out: &mut impl Write, node: &DirectoryNode, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    writeln!(out, "{indent}{}/", node.name())?;
    for readme in &node.readmes {
        writeln!(out, "{indent}  {}", readme.file_name())?;
    }
    for child in &node.directories {
        print_node(out, child, depth + 1)?;
    }
    Ok(())
}

fn render_file(file: &Path, output: Option<&Path>) -> Result<()> {
    let file = std::path::absolute(file).with_context(|| format!("Invalid path {}", file.display()))?;
    let html = render_target(&file);
    match output {
        Some(path) => fs::write(path, html)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout().lock().write_all(html.as_bytes())?,
    }
    Ok(())
}

fn print_root_items(items: &[TreeItem]) {
    for item in items {
        println!("{}  {}", item.label, item.path.display());
    }
}

fn spawn_command_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(err) => eprintln!("[warn] {err}"),
            }
        }
    });
    rx
}

fn run_watch(root: &Path, output: PathBuf, file: Option<PathBuf>, flags: &ConfigFlags) -> Result<()> {
    let root = std::path::absolute(root).with_context(|| format!("Invalid root {}", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    let options = flags.discovery_options();
    let tree = TreeModel::new(&root, options.clone());
    let settings = RefreshSettings {
        mode: flags.effective_refresh_mode(),
        interval: flags.effective_refresh_interval(),
    };
    let preview = PreviewSession::new(Box::new(FileSurfaceProvider::new(output)), settings);

    let mut app = App::new(tree, preview).with_tree_listener(|items| {
        println!("-- README tree changed ({} entries)", items.len());
        print_root_items(items);
    });
    match FileWatcher::for_readmes(&root, options, TREE_WATCH_DEBOUNCE) {
        Ok(watcher) => app = app.with_tree_watcher(watcher),
        Err(err) => {
            tracing::warn!(error = %err, root = %root.display(), "tree watch unavailable");
            perf::log_event("watcher.error", format!("root={} err={err}", root.display()));
        }
    }

    print_root_items(&app.tree().root_items());
    if let Some(file) = file {
        app.dispatch(Command::Preview(file));
    }

    let commands = spawn_command_reader();
    app.run(&commands, DEFAULT_POLL_INTERVAL);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.perf)?;
    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("README_PREVIEW_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize debug log {}: {}",
            debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    match cli.command {
        CliCommand::Tree { root } => print_tree(&root, effective.discovery_options()),
        CliCommand::Render { file, output } => render_file(&file, output.as_deref()),
        CliCommand::Watch { root, output, file } => run_watch(&root, output, file, &effective)
            .context("Preview host error"),
    }
}
