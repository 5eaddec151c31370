use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::warn;

use crate::models::CellValue;
use crate::time_utils::excel_serial_to_datetime;

// ── DurationProcessor ─────────────────────────────────────────────────────────

/// Parses the execution-duration column of scheduler exports.
///
/// `0.0` is the "could not parse" sentinel; callers fall back to the
/// start/end timestamps when they see it.
pub struct DurationProcessor;

fn minutes_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)'\s*(\d+)''").expect("regex is valid"))
}

fn job_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9_-]+$").expect("regex is valid"))
}

fn float_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("regex is valid")
    })
}

impl DurationProcessor {
    /// Duration in minutes for a cell value.
    ///
    /// * number → taken as minutes already
    /// * `5' 30''` → `5.5`
    /// * bare job-name token (`JOB_NAME_1`) → `0.0`
    /// * anything else → leading float, or `0.0`
    pub fn parse(value: &CellValue) -> f64 {
        match value {
            CellValue::Number(n) if n.is_finite() => *n,
            CellValue::Text(s) => Self::parse_str(s),
            _ => 0.0,
        }
    }

    /// String half of [`DurationProcessor::parse`].
    pub fn parse_str(s: &str) -> f64 {
        let s = s.trim();
        if s.is_empty() {
            return 0.0;
        }

        if let Some(minutes) = Self::parse_minutes_quote(s) {
            return minutes;
        }

        // Leaked job names are upper-case tokens; a pure number is not one.
        if job_token_re().is_match(s) && s.chars().any(|c| c.is_ascii_uppercase() || c == '_') {
            return 0.0;
        }

        float_prefix_re()
            .find(s)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }

    /// Match the `N' M''` minutes/seconds notation anywhere in `s`.
    pub fn parse_minutes_quote(s: &str) -> Option<f64> {
        let caps = minutes_quote_re().captures(s)?;
        let minutes = caps[1].parse::<f64>().unwrap_or(0.0);
        let seconds = caps[2].parse::<f64>().unwrap_or(0.0);
        Some(minutes + seconds / 60.0)
    }
}

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses start/end timestamps from the variety of shapes found in exports.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Attempt to parse a cell into a naive local timestamp.
    ///
    /// Handles:
    /// * datetime cell → unchanged
    /// * number        → Excel serial (epoch 1899-12-30)
    /// * text          → RFC 3339 or a list of common patterns
    ///
    /// Never panics; anything unparseable is `None`.
    pub fn parse(value: &CellValue) -> Option<NaiveDateTime> {
        match value {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Number(n) => excel_serial_to_datetime(*n),
            CellValue::Text(s) => Self::parse_str(s),
            _ => None,
        }
    }

    /// Zone-qualified RFC 3339 strings are converted to UTC.
    pub fn parse_str(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.naive_utc());
        }

        const DATETIME_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%m/%d/%Y %I:%M:%S %p",
            "%m/%d/%Y %I:%M %p",
            "%m/%d/%Y %H:%M:%S",
            "%m/%d/%Y %H:%M",
        ];
        for fmt in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        None
    }

    /// Minutes from `start` to `end`.
    ///
    /// A negative span is logged and reported as `0.0`; it never propagates.
    pub fn duration_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        let millis = (end - start).num_milliseconds();
        let minutes = millis as f64 / 60_000.0;
        if minutes < 0.0 {
            warn!(%start, %end, "negative duration detected; discarding");
            return 0.0;
        }
        minutes
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
