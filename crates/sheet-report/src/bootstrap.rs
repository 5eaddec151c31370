use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.sheet-report/`, `~/.sheet-report/logs/` and
/// `~/.sheet-report/reports/` exist.
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

/// Create the hierarchy under `home` and return the application directory.
pub fn ensure_directories_in(home: &Path) -> anyhow::Result<PathBuf> {
    let app_dir = home.join(".sheet-report");
    std::fs::create_dir_all(app_dir.join("logs"))?;
    std::fs::create_dir_all(app_dir.join("reports"))?;
    Ok(app_dir)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `DEBUG/INFO/WARNING/ERROR/CRITICAL` level name to an
/// [`EnvFilter`] directive. Unknown names fall back to `info`.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Events go to stderr unless `tui` is set, and are additionally appended
/// to `log_file` when one is given.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>, tui: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = (!tui).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
    });

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories_in() {
        let tmp = TempDir::new().expect("tempdir");
        let app_dir = ensure_directories_in(tmp.path()).expect("bootstrap");

        assert_eq!(app_dir, tmp.path().join(".sheet-report"));
        assert!(app_dir.join("logs").is_dir(), "logs subdir must exist");
        assert!(app_dir.join("reports").is_dir(), "reports subdir must exist");
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let tmp = TempDir::new().expect("tempdir");
        ensure_directories_in(tmp.path()).expect("first run");
        ensure_directories_in(tmp.path()).expect("second run");
    }

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("info"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("verbose"), "info");
    }
}
