//! Change-request form extraction.
//!
//! Pulls the maintenance window (times and dates) and the descriptive
//! fields out of the first sheet of a CRQ spreadsheet.

use std::path::Path;

use report_core::error::{ReportError, Result};
use report_core::models::{CellGrid, CellValue, CrqRecord, FieldKey, HeaderLocation, Workbook};
use report_core::time_utils::{
    date_bounds, normalize_date, normalize_date_string, pick_time, DateContext, TimeBound,
    TimeCandidate,
};
use tracing::{debug, info};

use crate::locator::{find_header_locations, label_text, value_near, HeaderLocations};

/// Rows below a time label that may still hold a time.
pub const TIME_SEARCH_ROWS: u32 = 20;
/// Rows below a date header that may still hold a date.
pub const DATE_SEARCH_ROWS: u32 = 20;
/// Extent of the header-free date scan, counted from the range start.
pub const FALLBACK_SCAN_ROWS: u32 = 30;
pub const FALLBACK_SCAN_COLS: u32 = 10;

/// Substrings that mark a column of dates.
pub const DATE_HEADER_TERMS: &[&str] = &[
    "data",
    "data início",
    "data inicio",
    "data fim",
    "data término",
    "data termino",
];

// ── Times ─────────────────────────────────────────────────────────────────────

/// Time cells in the label's column, from the label row down
/// [`TIME_SEARCH_ROWS`] rows, clamped to the end of the sheet.
pub fn collect_time_candidates(grid: &CellGrid, location: &HeaderLocation) -> Vec<TimeCandidate> {
    let Some(range) = grid.range() else {
        return Vec::new();
    };
    let last = range.end_row.min(location.row + TIME_SEARCH_ROWS);
    (location.row..=last)
        .filter_map(|row| TimeCandidate::from_cell(grid.get(row, location.col)))
        .collect()
}

/// Start and end time of the maintenance window as `HH:MM`.
pub fn extract_times(grid: &CellGrid, locations: &HeaderLocations) -> (String, String) {
    let resolve = |field: FieldKey, bound: TimeBound| {
        locations
            .get(&field)
            .map(|loc| pick_time(&collect_time_candidates(grid, loc), bound))
            .unwrap_or_default()
    };
    (
        resolve(FieldKey::StartTime, TimeBound::Earliest),
        resolve(FieldKey::EndTime, TimeBound::Latest),
    )
}

// ── Dates ─────────────────────────────────────────────────────────────────────

fn is_date_header(value: &CellValue) -> bool {
    label_text(value)
        .map(|text| DATE_HEADER_TERMS.iter().any(|term| text.contains(term)))
        .unwrap_or(false)
}

/// Dates found beneath every date header, in header scan order.
///
/// Numbers under a header are read as Excel serial dates.
pub fn dates_under_headers(grid: &CellGrid, ctx: DateContext) -> Vec<String> {
    let Some(range) = grid.range() else {
        return Vec::new();
    };

    let headers: Vec<(u32, u32)> = grid
        .cells()
        .filter(|(_, _, value)| is_date_header(value))
        .map(|(row, col, _)| (row, col))
        .collect();

    let mut dates = Vec::new();
    for (header_row, col) in headers {
        let last = range.end_row.min(header_row + DATE_SEARCH_ROWS);
        for row in header_row + 1..=last {
            let value = grid.get(row, col);
            if !value.is_truthy() {
                continue;
            }
            if let Some(date) = normalize_date(value, ctx) {
                debug!(row, col, date = %date, "date recognised under header");
                dates.push(date);
            }
        }
    }
    dates
}

/// Date-shaped text anywhere in the top-left corner of the sheet.
///
/// Only text cells are matched. Numeric and date-typed cells are ignored
/// here; they only count under a date header.
pub fn dates_anywhere(grid: &CellGrid, ctx: DateContext) -> Vec<String> {
    let Some(range) = grid.range() else {
        return Vec::new();
    };
    let last_row = range.end_row.min(range.start_row + FALLBACK_SCAN_ROWS);
    let last_col = range.end_col.min(range.start_col + FALLBACK_SCAN_COLS);

    let mut dates = Vec::new();
    for row in range.start_row..=last_row {
        for col in range.start_col..=last_col {
            if let CellValue::Text(s) = grid.get(row, col) {
                if let Some(date) = normalize_date_string(s, ctx) {
                    debug!(row, col, date = %date, "date recognised by fallback scan");
                    dates.push(date);
                }
            }
        }
    }
    dates
}

/// Start and end date of the maintenance window as `DD/MM/YYYY`.
pub fn extract_dates(grid: &CellGrid, ctx: DateContext) -> (String, String) {
    let mut dates = dates_under_headers(grid, ctx);
    if dates.is_empty() {
        dates = dates_anywhere(grid, ctx);
    }
    date_bounds(&dates)
}

// ── Records ───────────────────────────────────────────────────────────────────

/// Extract a full record from one sheet.
pub fn extract_record(grid: &CellGrid, ctx: DateContext) -> CrqRecord {
    let locations = find_header_locations(grid);
    debug!(located = locations.len(), "header scan finished");

    let (start_time, end_time) = extract_times(grid, &locations);
    let (start_date, end_date) = extract_dates(grid, ctx);
    let field = |key: FieldKey| value_near(grid, locations.get(&key), key);

    CrqRecord {
        start_time,
        start_date,
        end_time,
        end_date,
        scope_description: field(FieldKey::ScopeDescription),
        impact: field(FieldKey::Impact),
        affected_area: field(FieldKey::AffectedArea),
        responsible_party: field(FieldKey::ResponsibleParty),
    }
}

/// Extract the record from the first sheet of a decoded workbook.
///
/// A workbook without sheets, or whose first sheet has no cells, is an
/// [`ReportError::EmptyWorkbook`].
pub fn process_workbook(path: &Path, workbook: &Workbook, ctx: DateContext) -> Result<CrqRecord> {
    let grid = match workbook.first_sheet() {
        Some((_, grid)) if !grid.is_empty() => grid,
        _ => return Err(ReportError::EmptyWorkbook(path.to_path_buf())),
    };
    let record = extract_record(grid, ctx);
    info!(
        file = %path.display(),
        start = %record.start_time,
        end = %record.end_time,
        "change request extracted"
    );
    Ok(record)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
