//! Time, date and Excel-serial normalisation heuristics.
//!
//! Spreadsheet forms write the same instant in many shapes: Excel
//! fractional days, `22:00`, `7h30`, `2-nov`, `02/07/25`, serial dates.
//! Everything here reduces those shapes to canonical `HH:MM` and
//! `DD/MM/YYYY` strings.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

use crate::models::CellValue;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Supplies "now" in the user's timezone.
///
/// Year-less dates (`2-nov`, `12/07`) resolve against the current year, and
/// activity-log lines are stamped with local wall-clock time; both come from
/// here so they agree with each other.
#[derive(Debug, Clone)]
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for `tz_name`; `"auto"` means the system timezone.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let name = if tz_name == "auto" {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Current instant in the configured timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.default_tz)
    }

    /// Calendar year "today" in the configured timezone.
    pub fn current_year(&self) -> i32 {
        self.now().year()
    }

    /// `HH:MM:SS` wall-clock time, used to stamp log lines.
    pub fn local_time_string(&self) -> String {
        self.now().format("%H:%M:%S").to_string()
    }

    /// Expose the configured default timezone.
    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

// ── Excel serials ─────────────────────────────────────────────────────────────

/// Day zero of the Excel 1900 date system as used by every modern reader.
pub fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Calendar date of an Excel serial; the fractional (time) part is dropped.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor();
    if days.abs() > 3_000_000.0 {
        return None;
    }
    excel_epoch()
        .date()
        .checked_add_signed(Duration::days(days as i64))
}

/// Full timestamp of an Excel serial, with millisecond precision.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial.abs() > 3_000_000.0 {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    excel_epoch().checked_add_signed(Duration::milliseconds(millis))
}

// ── Time of day ───────────────────────────────────────────────────────────────

fn time_colon_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})(:\d{2})?$").expect("regex is valid"))
}

fn time_h_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})h:?(\d{2})$").expect("regex is valid"))
}

/// Normalise `H:MM[:SS]`, `HhMM` or `Hh:MM` to zero-padded `HH:MM`.
///
/// Returns `None` for anything else, including the `-` and `N/A`
/// placeholders forms use for "not applicable".
pub fn normalize_time_string(s: &str) -> Option<String> {
    let v = s.trim().to_lowercase();
    let caps = time_colon_re()
        .captures(&v)
        .or_else(|| time_h_re().captures(&v))?;
    Some(format!("{:0>2}:{}", &caps[1], &caps[2]))
}

/// Format an Excel fraction of a day (`0.9166…`) as `HH:MM`.
///
/// Rounds to the nearest minute so binary noise in the serial
/// (`21:59:59.999…`) does not shave a minute off.
pub fn format_day_fraction(fraction: f64) -> String {
    let total = ((fraction * 1440.0).round() as i64).clamp(0, 1439);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// A recognised time cell, before the start/end bound is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeCandidate {
    /// Excel fraction of a day in `(0, 1)`.
    Numeric(f64),
    /// Already normalised `HH:MM` text.
    Text(String),
}

impl TimeCandidate {
    /// Classify a cell; `None` when the value is not a time.
    pub fn from_cell(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Number(n) if *n > 0.0 && *n < 1.0 => Some(TimeCandidate::Numeric(*n)),
            CellValue::Text(s) => normalize_time_string(s).map(TimeCandidate::Text),
            _ => None,
        }
    }
}

/// Which bound of a maintenance window is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    Earliest,
    Latest,
}

/// Collapse candidates to one `HH:MM`, or `""` when there are none.
///
/// Numeric candidates win whenever at least one exists; text candidates
/// compare lexicographically, which is chronological for `HH:MM`.
pub fn pick_time(candidates: &[TimeCandidate], bound: TimeBound) -> String {
    let numbers = candidates.iter().filter_map(|c| match c {
        TimeCandidate::Numeric(n) => Some(*n),
        TimeCandidate::Text(_) => None,
    });
    let numeric = match bound {
        TimeBound::Earliest => numbers.fold(None, |acc: Option<f64>, n| {
            Some(acc.map_or(n, |a| a.min(n)))
        }),
        TimeBound::Latest => numbers.fold(None, |acc: Option<f64>, n| {
            Some(acc.map_or(n, |a| a.max(n)))
        }),
    };
    if let Some(n) = numeric {
        return format_day_fraction(n);
    }

    let texts = candidates.iter().filter_map(|c| match c {
        TimeCandidate::Text(s) => Some(s.as_str()),
        TimeCandidate::Numeric(_) => None,
    });
    let picked = match bound {
        TimeBound::Earliest => texts.min(),
        TimeBound::Latest => texts.max(),
    };
    picked.map(str::to_string).unwrap_or_default()
}

// ── Calendar dates ────────────────────────────────────────────────────────────

/// Inputs that normalisation needs from the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateContext {
    /// Year assumed for shapes that carry none (`2-nov`, `12/07`).
    pub current_year: i32,
}

impl DateContext {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn from_handler(handler: &TimezoneHandler) -> Self {
        Self::new(handler.current_year())
    }
}

struct DateShapes {
    day_month_name: Regex,
    day_month_year: Regex,
    year_month_day: Regex,
    day_month: Regex,
}

fn date_shapes() -> &'static DateShapes {
    static SHAPES: OnceLock<DateShapes> = OnceLock::new();
    SHAPES.get_or_init(|| DateShapes {
        day_month_name: Regex::new(r"^(\d{1,2})[-/]([a-z]{3,})$").expect("regex is valid"),
        day_month_year: Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{2,4})$")
            .expect("regex is valid"),
        year_month_day: Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$")
            .expect("regex is valid"),
        day_month: Regex::new(r"^(\d{1,2})[-/](\d{1,2})$").expect("regex is valid"),
    })
}

/// Month number for a Portuguese or English name; unknown names map to `01`.
pub fn month_from_name(name: &str) -> &'static str {
    let prefix: String = name.chars().take(3).collect();
    match prefix.as_str() {
        "jan" => "01",
        "fev" | "feb" => "02",
        "mar" => "03",
        "abr" | "apr" => "04",
        "mai" | "may" => "05",
        "jun" => "06",
        "jul" => "07",
        "ago" | "aug" => "08",
        "set" | "sep" => "09",
        "out" | "oct" => "10",
        "nov" => "11",
        "dez" | "dec" => "12",
        _ => "01",
    }
}

/// Normalise a date-shaped string to `DD/MM/YYYY`.
pub fn normalize_date_string(s: &str, ctx: DateContext) -> Option<String> {
    let v = s.trim().to_lowercase();
    let shapes = date_shapes();

    if let Some(c) = shapes.day_month_name.captures(&v) {
        return Some(format!(
            "{:0>2}/{}/{}",
            &c[1],
            month_from_name(&c[2]),
            ctx.current_year
        ));
    }
    if let Some(c) = shapes.day_month_year.captures(&v) {
        let year = if c[3].len() == 2 {
            format!("20{}", &c[3])
        } else {
            c[3].to_string()
        };
        return Some(format!("{:0>2}/{:0>2}/{}", &c[1], &c[2], year));
    }
    if let Some(c) = shapes.year_month_day.captures(&v) {
        return Some(format!("{:0>2}/{:0>2}/{}", &c[3], &c[2], &c[1]));
    }
    if let Some(c) = shapes.day_month.captures(&v) {
        return Some(format!("{:0>2}/{:0>2}/{}", &c[1], &c[2], ctx.current_year));
    }
    None
}

/// Format an Excel serial as `DD/MM/YYYY`.
pub fn normalize_serial_date(serial: f64) -> Option<String> {
    excel_serial_to_date(serial).map(|d| d.format("%d/%m/%Y").to_string())
}

/// Normalise any cell under a date header.
///
/// Numbers are Excel serial dates; text must match one of the four date
/// shapes.
pub fn normalize_date(value: &CellValue, ctx: DateContext) -> Option<String> {
    match value {
        CellValue::Number(n) => normalize_serial_date(*n),
        CellValue::Text(s) => normalize_date_string(s, ctx),
        CellValue::DateTime(dt) => Some(dt.format("%d/%m/%Y").to_string()),
        _ => None,
    }
}

/// Parse a `DD/MM/YYYY` string back to a calendar date.
pub fn parse_normalized_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let day = parts.next()?.parse::<u32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let year = parts.next()?.parse::<i32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Reduce normalised dates to `(start, end)`.
///
/// A single date is both bounds as-is; with several, the ones that are
/// real calendar dates are sorted and the extremes taken.
pub fn date_bounds(dates: &[String]) -> (String, String) {
    match dates {
        [] => (String::new(), String::new()),
        [only] => (only.clone(), only.clone()),
        many => {
            let mut parsed: Vec<NaiveDate> =
                many.iter().filter_map(|s| parse_normalized_date(s)).collect();
            parsed.sort();
            let fmt = |d: &NaiveDate| d.format("%d/%m/%Y").to_string();
            (
                parsed.first().map(fmt).unwrap_or_default(),
                parsed.last().map(fmt).unwrap_or_default(),
            )
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> DateContext {
        DateContext::new(2025)
    }

    // ── Times ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_time_variants() {
        assert_eq!(normalize_time_string("7h30").as_deref(), Some("07:30"));
        assert_eq!(normalize_time_string("22:00:15").as_deref(), Some("22:00"));
        assert_eq!(normalize_time_string("7:05").as_deref(), Some("07:05"));
        assert_eq!(normalize_time_string("22H:00").as_deref(), Some("22:00"));
        assert_eq!(normalize_time_string("  09h15 ").as_deref(), Some("09:15"));
    }

    #[test]
    fn test_normalize_time_rejects_placeholders() {
        assert_eq!(normalize_time_string("-"), None);
        assert_eq!(normalize_time_string("N/A"), None);
        assert_eq!(normalize_time_string("22:0"), None);
        assert_eq!(normalize_time_string("123:00"), None);
    }

    #[test]
    fn test_format_day_fraction() {
        assert_eq!(format_day_fraction(22.0 / 24.0), "22:00");
        assert_eq!(format_day_fraction(0.3125), "07:30");
        assert_eq!(format_day_fraction(19.0 / 24.0), "19:00");
        assert_eq!(format_day_fraction(0.9999999), "23:59");
    }

    #[test]
    fn test_time_candidate_from_cell() {
        assert_eq!(
            TimeCandidate::from_cell(&CellValue::Number(0.5)),
            Some(TimeCandidate::Numeric(0.5))
        );
        assert_eq!(TimeCandidate::from_cell(&CellValue::Number(1.0)), None);
        assert_eq!(TimeCandidate::from_cell(&CellValue::Number(0.0)), None);
        assert_eq!(
            TimeCandidate::from_cell(&CellValue::text("6h00")),
            Some(TimeCandidate::Text("06:00".to_string()))
        );
        assert_eq!(TimeCandidate::from_cell(&CellValue::text("N/A")), None);
    }

    #[test]
    fn test_pick_time_numeric_wins() {
        let candidates = vec![
            TimeCandidate::Text("01:00".to_string()),
            TimeCandidate::Numeric(22.0 / 24.0),
            TimeCandidate::Numeric(23.0 / 24.0),
        ];
        assert_eq!(pick_time(&candidates, TimeBound::Earliest), "22:00");
        assert_eq!(pick_time(&candidates, TimeBound::Latest), "23:00");
    }

    #[test]
    fn test_pick_time_text_lexicographic() {
        let candidates = vec![
            TimeCandidate::Text("22:00".to_string()),
            TimeCandidate::Text("06:30".to_string()),
            TimeCandidate::Text("23:15".to_string()),
        ];
        assert_eq!(pick_time(&candidates, TimeBound::Earliest), "06:30");
        assert_eq!(pick_time(&candidates, TimeBound::Latest), "23:15");
        assert_eq!(pick_time(&[], TimeBound::Earliest), "");
    }

    // ── Dates ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_date_shapes() {
        assert_eq!(
            normalize_date_string("2/07/2025", ctx()).as_deref(),
            Some("02/07/2025")
        );
        assert_eq!(
            normalize_date_string("02-07-25", ctx()).as_deref(),
            Some("02/07/2025")
        );
        assert_eq!(
            normalize_date_string("2025-7-2", ctx()).as_deref(),
            Some("02/07/2025")
        );
        assert_eq!(
            normalize_date_string("12/07", ctx()).as_deref(),
            Some("12/07/2025")
        );
    }

    #[test]
    fn test_normalize_date_month_names() {
        assert_eq!(
            normalize_date_string("2-nov", ctx()).as_deref(),
            Some("02/11/2025")
        );
        assert_eq!(
            normalize_date_string("15-Fev", ctx()).as_deref(),
            Some("15/02/2025")
        );
        assert_eq!(
            normalize_date_string("1-outubro", ctx()).as_deref(),
            Some("01/10/2025")
        );
        // Unknown month names fall back to January.
        assert_eq!(
            normalize_date_string("3-xyz", ctx()).as_deref(),
            Some("03/01/2025")
        );
    }

    #[test]
    fn test_normalize_date_rejects_non_dates() {
        assert_eq!(normalize_date_string("Data", ctx()), None);
        assert_eq!(normalize_date_string("22:00", ctx()), None);
        assert_eq!(normalize_date_string("2025", ctx()), None);
    }

    #[test]
    fn test_normalize_serial_date() {
        assert_eq!(normalize_serial_date(45840.0).as_deref(), Some("02/07/2025"));
        assert_eq!(normalize_serial_date(45840.75).as_deref(), Some("02/07/2025"));
        assert_eq!(normalize_serial_date(1.0).as_deref(), Some("31/12/1899"));
        assert_eq!(normalize_serial_date(f64::NAN), None);
    }

    #[test]
    fn test_date_bounds() {
        assert_eq!(date_bounds(&[]), (String::new(), String::new()));
        let one = vec!["05/08/2025".to_string()];
        assert_eq!(
            date_bounds(&one),
            ("05/08/2025".to_string(), "05/08/2025".to_string())
        );
        let many = vec![
            "10/08/2025".to_string(),
            "31/07/2025".to_string(),
            "31/02/2025".to_string(),
            "01/08/2025".to_string(),
        ];
        assert_eq!(
            date_bounds(&many),
            ("31/07/2025".to_string(), "10/08/2025".to_string())
        );
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        let dt = excel_serial_to_datetime(45840.5).unwrap();
        assert_eq!(dt.to_string(), "2025-07-02 12:00:00");
    }

    #[test]
    fn test_timezone_handler_fallback() {
        let handler = TimezoneHandler::new("Not/AZone");
        assert_eq!(handler.default_tz(), Tz::UTC);
        assert!(TimezoneHandler::validate_timezone("America/Sao_Paulo"));
        assert!(!TimezoneHandler::validate_timezone("Mars/Olympus"));
    }

    proptest! {
        #[test]
        fn prop_serial_date_matches_calendar(days in 1i64..2_958_465, frac in 0.0f64..0.999) {
            let expected = excel_epoch().date() + Duration::days(days);
            let normalized = normalize_serial_date(days as f64 + frac).unwrap();
            prop_assert_eq!(normalized, expected.format("%d/%m/%Y").to_string());
        }

        #[test]
        fn prop_time_strings_pad(hour in 0u32..24, minute in 0u32..60, h_sep in proptest::bool::ANY) {
            let raw = if h_sep {
                format!("{}h{:02}", hour, minute)
            } else {
                format!("{}:{:02}", hour, minute)
            };
            let normalized = normalize_time_string(&raw).unwrap();
            prop_assert_eq!(normalized, format!("{:02}:{:02}", hour, minute));
        }
    }
}
