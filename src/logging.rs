//! Logging setup: every event goes to the console and to a log file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// File name used when no log file is configured.
pub const DEFAULT_LOG_FILE: &str = "tidywatch.log";

/// Default log location: `<local data dir>/tidywatch/tidywatch.log`, or the
/// current directory when no data directory is known.
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("tidywatch").join(DEFAULT_LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initializes the global subscriber.
///
/// Level filtering comes from `RUST_LOG`, defaulting to `info`. If the log
/// file cannot be opened, logging continues on the console only.
///
/// Returns the log file in use, if any.
pub fn init_logging(log_file: &Path) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false).with_level(true);

    match open_log_file(log_file) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));

            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file_layer)
                .init();
            Some(log_file.to_path_buf())
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            warn!(
                path = %log_file.display(),
                error = %e,
                "Could not open log file, logging to console only"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_log_path_file_name() {
        assert_eq!(
            default_log_path().file_name().and_then(|n| n.to_str()),
            Some(DEFAULT_LOG_FILE)
        );
    }

    #[test]
    fn test_open_log_file_creates_parents_and_appends() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("dir").join("t.log");

        {
            use std::io::Write;
            let mut file = open_log_file(&path).expect("Failed to open log file");
            writeln!(file, "first").unwrap();
        }
        {
            use std::io::Write;
            let mut file = open_log_file(&path).expect("Failed to reopen log file");
            writeln!(file, "second").unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
