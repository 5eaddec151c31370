use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Change-request scraping and overdue-job reports for spreadsheet exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sheet-report",
    about = "Change-request scraping and overdue-job reports for spreadsheet exports",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Display theme
    #[arg(long, global = true, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Timezone used for year-less dates and log timestamps (auto-detected if not specified)
    #[arg(long, global = true, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long, global = true)]
    pub clear: bool,
}

/// The two tools.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Extract change-request fields from form spreadsheets into HTML cards
    Crq {
        /// Spreadsheet files or directories containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// HTML file to write (defaults to the last used path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Chart overdue counts, mean duration and variation per job
    Overdue {
        /// Scheduler export files or directories containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print a plain-text report instead of opening the terminal UI
        #[arg(long)]
        no_tui: bool,

        /// Print the three report views as JSON
        #[arg(long, conflicts_with = "no_tui")]
        json: bool,
    },
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.sheet-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crq_output: Option<PathBuf>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.sheet-report/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&home_dir())
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".sheet-report").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Default location of the CRQ HTML report: `~/.sheet-report/reports/crq-report.html`.
pub fn default_crq_output() -> PathBuf {
    default_crq_output_in(&home_dir())
}

fn default_crq_output_in(base_dir: &Path) -> PathBuf {
    base_dir
        .join(".sheet-report")
        .join("reports")
        .join("crq-report.html")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        let base_dir = config_path
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(home_dir);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            settings.fill_crq_output(None, &base_dir);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme.clone() {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone.clone() {
                settings.timezone = v;
            }
        }
        // NOTE: clap stores the arg id using the *field name* (underscores),
        // not the long-flag spelling (hyphens).
        if !is_arg_explicitly_set(&matches, "log_level") {
            if let Some(v) = last.log_level.clone() {
                settings.log_level = v;
            }
        }
        settings.fill_crq_output(last.crq_output.clone(), &base_dir);

        // Persist before --debug rewrites the level, so it stays one-shot.
        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        Self::apply_debug(settings)
    }

    /// The spreadsheet paths named on the command line.
    pub fn files(&self) -> &[PathBuf] {
        match &self.command {
            Command::Crq { files, .. } | Command::Overdue { files, .. } => files,
        }
    }

    /// `true` when the overdue command will take over the terminal.
    pub fn uses_tui(&self) -> bool {
        matches!(
            self.command,
            Command::Overdue {
                no_tui: false,
                json: false,
                ..
            }
        )
    }

    fn fill_crq_output(&mut self, last: Option<PathBuf>, base_dir: &Path) {
        if let Command::Crq { output, .. } = &mut self.command {
            if output.is_none() {
                *output = Some(last.unwrap_or_else(|| default_crq_output_in(base_dir)));
            }
        }
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        let crq_output = match &s.command {
            Command::Crq { output, .. } => output.clone(),
            Command::Overdue { .. } => None,
        };
        LastUsedParams {
            theme: Some(s.theme.clone()),
            timezone: Some(s.timezone.clone()),
            log_level: Some(s.log_level.clone()),
            crq_output,
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
