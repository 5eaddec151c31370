//! In-memory status and error logs shown alongside the charts.
//!
//! Every entry is also forwarded to `tracing`, so the same messages reach a
//! log file when one is configured.

use std::collections::VecDeque;

use report_core::time_utils::TimezoneHandler;

/// Oldest lines are dropped past this many entries per log.
pub const MAX_LOG_LINES: usize = 500;

/// A timestamped status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub message: String,
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.time, self.message)
    }
}

/// Debug log (timestamped status lines) plus a separate error log.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    timezone: TimezoneHandler,
    debug: VecDeque<LogLine>,
    errors: VecDeque<String>,
}

impl ActivityLog {
    pub fn new(timezone: TimezoneHandler) -> Self {
        Self {
            timezone,
            debug: VecDeque::new(),
            errors: VecDeque::new(),
        }
    }

    /// Append a status line.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        push_bounded(
            &mut self.debug,
            LogLine {
                time: self.timezone.local_time_string(),
                message,
            },
        );
    }

    /// Append an error line.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        push_bounded(&mut self.errors, message);
    }

    pub fn debug_lines(&self) -> impl Iterator<Item = &LogLine> {
        self.debug.iter()
    }

    pub fn error_lines(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.debug.is_empty() && self.errors.is_empty()
    }

    /// Empty both logs.
    pub fn clear(&mut self) {
        self.debug.clear();
        self.errors.clear();
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, item: T) {
    if buf.len() == MAX_LOG_LINES {
        buf.pop_front();
    }
    buf.push_back(item);
}
