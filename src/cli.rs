//! Command-line interface module for tidywatch.
//!
//! This module handles:
//! - Argument parsing
//! - Resolving the watched root and settings
//! - Running the watcher until a shutdown signal arrives
//! - The `check` readiness report

use crate::config::{CompiledFilters, Settings};
use crate::error::StartupError;
use crate::file_category::Classifier;
use crate::file_organizer::Organizer;
use crate::logging;
use crate::output::OutputFormatter;
use crate::watcher::Dispatcher;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// Watch a folder and sort new files into category folders by extension.
#[derive(Debug, Parser)]
#[command(name = "tidywatch", version, about)]
pub struct Cli {
    /// Settings file (default: ./.tidywatch.toml, then the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The command to run; watching the default folder when none was given.
    pub fn command_or_default(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Watch(WatchArgs::default()))
    }
}

/// Subcommands. Running without one watches.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a folder until interrupted (default)
    Watch(WatchArgs),
    /// Check that the folder can be organized and watched
    Check {
        /// Folder to check (default: desktop)
        root: Option<PathBuf>,
    },
}

/// Options for watching.
#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    /// Folder to watch (default: desktop)
    pub root: Option<PathBuf>,

    /// Log file (default: <data dir>/tidywatch/tidywatch.log)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Milliseconds a new file must go unmodified before it is moved
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,
}

/// Picks the watched root: explicit path, then settings, then the desktop.
///
/// # Errors
///
/// Returns [`StartupError::NoDesktop`] when nothing is configured and no
/// desktop or home directory can be found.
pub fn resolve_root(explicit: Option<&Path>, settings: &Settings) -> Result<PathBuf, StartupError> {
    if let Some(path) = explicit.or(settings.watch.root.as_deref()) {
        return Ok(path.to_path_buf());
    }
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .ok_or(StartupError::NoDesktop)
}

/// Watches until Ctrl+C or SIGTERM.
///
/// Startup failures (bad settings, unusable root, no notification support)
/// are returned before anything is moved.
pub async fn run_watch(args: WatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let settings = Settings::load(config_path).context("failed to load settings")?;

    let log_file = args
        .log_file
        .clone()
        .or_else(|| settings.watch.log_file.clone())
        .unwrap_or_else(logging::default_log_path);
    logging::init_logging(&log_file);

    let filters = CompiledFilters::new(&settings.filters).context("invalid filter rules")?;
    let settle = args
        .settle_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.watch.settle());

    let root = resolve_root(args.root.as_deref(), &settings)?;
    let organizer = Organizer::new(&root, Classifier::default())?;

    let mut dispatcher = Dispatcher::new(organizer, filters, settle);
    dispatcher.start()?;
    info!("Starting file organizer. Press Ctrl+C to stop");

    wait_for_shutdown().await;

    info!("Stopping file organizer...");
    dispatcher.stop();
    Ok(())
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Runs the readiness checks and prints a report.
///
/// Returns `true` if every check passed.
pub fn run_check(root: Option<&Path>, config_path: Option<&Path>) -> bool {
    println!("tidywatch - readiness check");
    println!("{}", "=".repeat(50));

    let settings = match Settings::load(config_path) {
        Ok(settings) => settings,
        Err(e) => {
            OutputFormatter::error(&format!("Settings: {}", e));
            OutputFormatter::check_summary(0, 1);
            return false;
        }
    };

    let root = match resolve_root(root, &settings) {
        Ok(root) => root,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            OutputFormatter::check_summary(0, 1);
            return false;
        }
    };
    OutputFormatter::info(&format!("Folder: {}", root.display()));

    let checks: [(&str, fn(&Path) -> bool); 4] = [
        ("Watched folder", check_root_exists),
        ("Write permission", check_writable),
        ("Category folders", check_category_folders),
        ("File notifications", check_notifications),
    ];

    let mut passed = 0;
    for (title, check) in checks {
        OutputFormatter::header(title);
        if check(&root) {
            passed += 1;
        }
    }
    println!();
    OutputFormatter::check_summary(passed, checks.len());
    passed == checks.len()
}

fn check_root_exists(root: &Path) -> bool {
    if root.is_dir() {
        OutputFormatter::success(&format!("Folder found: {}", root.display()));
        true
    } else {
        OutputFormatter::error(&format!("Folder not found: {}", root.display()));
        false
    }
}

fn check_writable(root: &Path) -> bool {
    let probe = root.join(".tidywatch_write_test.tmp");
    match fs::write(&probe, "test").and_then(|()| fs::remove_file(&probe)) {
        Ok(()) => {
            OutputFormatter::success("Write permission - OK");
            true
        }
        Err(e) => {
            OutputFormatter::error(&format!("Write permission - Failed: {}", e));
            false
        }
    }
}

fn check_category_folders(root: &Path) -> bool {
    let classifier = Classifier::default();
    let missing: Vec<_> = classifier
        .categories()
        .into_iter()
        .filter(|c| !root.join(c.dir_name()).is_dir())
        .collect();

    match Organizer::new(root, classifier) {
        Ok(organizer) => {
            for category in organizer.classifier().categories() {
                if missing.contains(&category) {
                    OutputFormatter::success(&format!("Created folder: {}", category));
                } else {
                    OutputFormatter::success(&format!("Folder exists: {}", category));
                }
            }
            true
        }
        Err(e) => {
            OutputFormatter::error(&format!("Category folder creation failed: {}", e));
            false
        }
    }
}

fn check_notifications(root: &Path) -> bool {
    let organizer = match Organizer::new(root, Classifier::default()) {
        Ok(organizer) => organizer,
        Err(e) => {
            OutputFormatter::warning(&format!("Skipped: {}", e));
            return false;
        }
    };

    let mut dispatcher = Dispatcher::new(organizer, CompiledFilters::allow_all(), Duration::ZERO);
    match dispatcher.start() {
        Ok(()) => {
            dispatcher.stop();
            OutputFormatter::success("Filesystem notifications available");
            true
        }
        Err(e) => {
            OutputFormatter::error(&format!("Filesystem notifications unavailable: {}", e));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_means_watch_defaults() {
        let cli = Cli::try_parse_from(["tidywatch"]).unwrap();
        assert!(cli.config.is_none());
        match cli.command_or_default() {
            Command::Watch(args) => {
                assert!(args.root.is_none());
                assert!(args.settle_ms.is_none());
                assert!(args.log_file.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_watch_options() {
        let cli = Cli::try_parse_from([
            "tidywatch",
            "watch",
            "/tmp/desk",
            "--settle-ms",
            "250",
            "--log-file",
            "/tmp/tw.log",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Watch(args)) => {
                assert_eq!(args.root, Some(PathBuf::from("/tmp/desk")));
                assert_eq!(args.settle_ms, Some(250));
                assert_eq!(args.log_file, Some(PathBuf::from("/tmp/tw.log")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["tidywatch", "--config", "c.toml", "check", "/d"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(
            cli.command,
            Some(Command::Check { root: Some(ref p) }) if p == Path::new("/d")
        ));
    }

    #[test]
    fn test_resolve_root_prefers_explicit_then_settings() {
        let mut settings = Settings::default();
        settings.watch.root = Some(PathBuf::from("/from/settings"));

        assert_eq!(
            resolve_root(Some(Path::new("/explicit")), &settings).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(
            resolve_root(None, &settings).unwrap(),
            PathBuf::from("/from/settings")
        );
    }

    #[test]
    fn test_check_passes_on_fresh_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = temp_dir.path().join("settings.toml");
        fs::write(&config, "").unwrap();

        assert!(run_check(Some(temp_dir.path()), Some(&config)));
        assert!(temp_dir.path().join("Documents").is_dir());
        assert!(!temp_dir.path().join(".tidywatch_write_test.tmp").exists());
    }

    #[test]
    fn test_check_fails_on_missing_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = temp_dir.path().join("settings.toml");
        fs::write(&config, "").unwrap();
        let missing = temp_dir.path().join("missing");

        assert!(!run_check(Some(&missing), Some(&config)));
        assert!(!missing.exists());
    }
}
