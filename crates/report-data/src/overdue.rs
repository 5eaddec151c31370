//! Scheduler-export processing for the overdue report.
//!
//! Exports come in a few layouts. The header row is found by trying, in
//! order:
//!
//! 1. the first row with a `start date` cell, columns located by label;
//! 2. row 9 with fixed columns (job `A`, duration `L`, start `O`, end `Q`),
//!    accepted only when row 9 labels column `L` or `O`;
//! 3. a scan of every row for an `N' M''` duration cell.
//!
//! Every data row is then turned into at most one accepted execution.

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use report_core::data_processors::{DurationProcessor, TimestampProcessor};
use report_core::error::{ReportError, Result};
use report_core::models::{CellGrid, CellValue, Workbook};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregator::JobData;

/// Zero-based index of spreadsheet row 9.
pub const FIXED_HEADER_ROW: usize = 8;
pub const FIXED_DURATION_COL: usize = 11;
pub const FIXED_START_COL: usize = 14;
pub const FIXED_END_COL: usize = 16;

// ── Layout ────────────────────────────────────────────────────────────────────

/// Which header strategy matched a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    ColumnAnchored,
    FixedRow,
    FallbackScan,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ColumnAnchored => "column-anchored",
            Strategy::FixedRow => "fixed-row-9",
            Strategy::FallbackScan => "fallback-scan",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column indices of the fields read from each data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub job_name: usize,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub duration: Option<usize>,
}

impl ColumnMap {
    /// Columns of the fixed row-9 export.
    pub fn fixed() -> Self {
        Self {
            job_name: 0,
            start: Some(FIXED_START_COL),
            end: Some(FIXED_END_COL),
            duration: Some(FIXED_DURATION_COL),
        }
    }

    /// Locate columns by header label; the job name is always column `A`.
    ///
    /// The first header containing each label wins.
    pub fn from_headers(headers: &[&CellValue]) -> Self {
        let mut map = Self {
            job_name: 0,
            start: None,
            end: None,
            duration: None,
        };
        for (idx, header) in headers.iter().enumerate() {
            let Some(text) = header.display_text() else {
                continue;
            };
            let text = text.to_lowercase();
            let slot = if text.contains("start date") {
                &mut map.start
            } else if text.contains("end date") {
                &mut map.end
            } else if text.contains("duration") {
                &mut map.duration
            } else {
                continue;
            };
            slot.get_or_insert(idx);
        }
        map
    }
}

/// How data rows of a sheet are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Header row plus the columns found in it.
    Columns {
        strategy: Strategy,
        header_row: usize,
        columns: ColumnMap,
    },
    /// No header: every row is inspected on its own.
    Scan,
}

impl Layout {
    pub fn strategy(&self) -> Strategy {
        match self {
            Layout::Columns { strategy, .. } => *strategy,
            Layout::Scan => Strategy::FallbackScan,
        }
    }
}

fn is_start_date_header(value: &CellValue) -> bool {
    value
        .display_text()
        .map(|t| t.to_lowercase().contains("start date"))
        .unwrap_or(false)
}

fn quote_duration(value: &CellValue) -> Option<f64> {
    value
        .as_text()
        .and_then(DurationProcessor::parse_minutes_quote)
}

/// A cell that reads as a column label rather than data.
fn is_header_label(value: &CellValue) -> bool {
    value.as_text().is_some_and(|t| {
        let t = t.trim();
        t.chars().any(char::is_alphabetic)
            && DurationProcessor::parse_minutes_quote(t).is_none()
            && TimestampProcessor::parse_str(t).is_none()
    })
}

/// Row 9 of the fixed export labels the duration or start column.
fn has_fixed_headers(row: &[&CellValue]) -> bool {
    [FIXED_DURATION_COL, FIXED_START_COL]
        .iter()
        .any(|&col| row.get(col).is_some_and(|v| is_header_label(v)))
}

/// Pick the first strategy that applies to `rows`, or `None` when none does.
pub fn detect_layout(rows: &[Vec<&CellValue>]) -> Option<Layout> {
    if let Some(header_row) = rows
        .iter()
        .position(|row| row.iter().any(|v| is_start_date_header(v)))
    {
        return Some(Layout::Columns {
            strategy: Strategy::ColumnAnchored,
            header_row,
            columns: ColumnMap::from_headers(&rows[header_row]),
        });
    }

    if rows
        .get(FIXED_HEADER_ROW)
        .is_some_and(|row| has_fixed_headers(row))
    {
        return Some(Layout::Columns {
            strategy: Strategy::FixedRow,
            header_row: FIXED_HEADER_ROW,
            columns: ColumnMap::fixed(),
        });
    }

    let has_quote_durations = rows
        .iter()
        .any(|row| row.iter().any(|v| quote_duration(v).is_some()));
    has_quote_durations.then_some(Layout::Scan)
}

// ── Row processing ────────────────────────────────────────────────────────────

/// Counters of one processed sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub unique_jobs: usize,
}

/// Outcome of processing one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetReport {
    pub strategy: Strategy,
    pub header_row: Option<usize>,
    pub summary: RowSummary,
}

fn cell<'a>(row: &[&'a CellValue], col: usize) -> Option<&'a CellValue> {
    row.get(col).copied()
}

fn job_name(row: &[&CellValue], col: usize) -> Option<String> {
    cell(row, col)
        .and_then(CellValue::display_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Duration of a header-mapped row: the duration cell first, then the
/// start/end span when the cell gives nothing.
fn row_duration(
    row: &[&CellValue],
    columns: &ColumnMap,
) -> (f64, Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let start = columns
        .start
        .and_then(|c| cell(row, c))
        .and_then(TimestampProcessor::parse);
    let end = columns
        .end
        .and_then(|c| cell(row, c))
        .and_then(TimestampProcessor::parse);

    let mut duration = columns
        .duration
        .and_then(|c| cell(row, c))
        .map(DurationProcessor::parse)
        .unwrap_or(0.0);
    if duration == 0.0 {
        if let (Some(s), Some(e)) = (start, end) {
            duration = TimestampProcessor::duration_between(s, e);
            debug!(duration, "duration computed from start/end");
        }
    }
    (duration, start, end)
}

fn process_columns(
    rows: &[Vec<&CellValue>],
    header_row: usize,
    columns: &ColumnMap,
    jobs: &mut JobData,
    summary: &mut RowSummary,
) {
    for (offset, row) in rows.iter().enumerate().skip(header_row + 1) {
        summary.total += 1;
        let Some(name) = job_name(row, columns.job_name) else {
            summary.skipped += 1;
            continue;
        };
        let (duration, start, end) = row_duration(row, columns);
        if jobs.add_job(&name, duration, start, end) {
            summary.processed += 1;
        } else {
            debug!(row = offset, job = %name, "row has no usable duration");
            summary.errors += 1;
        }
    }
}

fn process_scan(rows: &[Vec<&CellValue>], jobs: &mut JobData, summary: &mut RowSummary) {
    for (offset, row) in rows.iter().enumerate() {
        summary.total += 1;
        let Some(name) = job_name(row, 0) else {
            summary.skipped += 1;
            continue;
        };
        let Some(duration) = row.iter().find_map(|v| quote_duration(v)) else {
            summary.skipped += 1;
            continue;
        };
        if jobs.add_job(&name, duration, None, None) {
            summary.processed += 1;
        } else {
            debug!(row = offset, job = %name, "row has no usable duration");
            summary.errors += 1;
        }
    }
}

/// Process one sheet into a fresh [`JobData`].
///
/// `source` names the sheet in errors and logs.
pub fn process_grid(source: &str, grid: &CellGrid) -> Result<(JobData, SheetReport)> {
    let rows = grid.rows();
    let layout = detect_layout(&rows).ok_or_else(|| {
        ReportError::MissingHeaderRow(format!(
            "{source}: no 'start date' header, row 9 or N' M'' durations"
        ))
    })?;
    debug!(source, strategy = %layout.strategy(), "layout detected");

    let mut jobs = JobData::new();
    let mut summary = RowSummary::default();
    let header_row = match &layout {
        Layout::Columns {
            header_row,
            columns,
            ..
        } => {
            process_columns(&rows, *header_row, columns, &mut jobs, &mut summary);
            Some(*header_row)
        }
        Layout::Scan => {
            process_scan(&rows, &mut jobs, &mut summary);
            None
        }
    };
    summary.unique_jobs = jobs.len();

    info!(
        source,
        strategy = %layout.strategy(),
        total = summary.total,
        processed = summary.processed,
        skipped = summary.skipped,
        errors = summary.errors,
        unique_jobs = summary.unique_jobs,
        "sheet processed"
    );

    Ok((
        jobs,
        SheetReport {
            strategy: layout.strategy(),
            header_row,
            summary,
        },
    ))
}

/// Process the first sheet of a decoded workbook.
pub fn process_workbook(path: &Path, workbook: &Workbook) -> Result<(JobData, SheetReport)> {
    let grid = match workbook.first_sheet() {
        Some((_, grid)) if !grid.is_empty() => grid,
        _ => return Err(ReportError::EmptyWorkbook(path.to_path_buf())),
    };
    process_grid(&path.display().to_string(), grid)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn grid(cells: &[(u32, u32, CellValue)]) -> CellGrid {
        CellGrid::from_cells(cells.iter().cloned())
    }

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    #[test]
    fn test_column_map_from_headers() {
        let a = text("Job Name");
        let b = text("Duration");
        let c = text("Start Date/Time");
        let d = text("End Date/Time");
        let e = text("Start Date (UTC)");
        let map = ColumnMap::from_headers(&[&a, &b, &c, &d, &e]);
        assert_eq!(map.job_name, 0);
        assert_eq!(map.duration, Some(1));
        assert_eq!(map.start, Some(2));
        assert_eq!(map.end, Some(3));
    }

    #[test]
    fn test_column_anchored_layout() {
        let g = grid(&[
            (0, 0, text("Scheduler export")),
            (2, 0, text("Job")),
            (2, 1, text("Duration")),
            (2, 2, text("Start Date")),
            (2, 3, text("End Date")),
            (3, 0, text("BKP_DAILY")),
            (3, 1, text("75' 30''")),
            (4, 0, text("ETL_LOAD")),
            (4, 1, text("ETL_LOAD")),
            (4, 2, text("07/02/2025 10:00:00 PM")),
            (4, 3, text("07/02/2025 11:30:00 PM")),
            (6, 0, text("BROKEN")),
            (6, 1, text("n/a")),
        ]);
        let (jobs, report) = process_grid("export.xlsx", &g).unwrap();
        assert_eq!(report.strategy, Strategy::ColumnAnchored);
        assert_eq!(report.header_row, Some(2));
        assert_eq!(
            report.summary,
            RowSummary {
                total: 4,
                processed: 2,
                skipped: 1,
                errors: 1,
                unique_jobs: 2,
            }
        );

        let bkp = jobs.analysis("BKP_DAILY").unwrap();
        assert!((bkp.durations.avg - 75.5).abs() < 1e-9);
        assert_eq!(bkp.overdue_count, 1);

        let etl = jobs.analysis("ETL_LOAD").unwrap();
        assert!((etl.durations.avg - 90.0).abs() < 1e-9);
        assert!(etl.executions[0].start.is_some());
    }

    #[test]
    fn test_fixed_row_layout() {
        let mut cells = vec![
            (0, 0, text("Relatório")),
            (8, 0, text("Job")),
            (8, FIXED_DURATION_COL as u32, text("Tempo")),
            (8, FIXED_START_COL as u32, text("Início")),
        ];
        cells.push((9, 0, text("JOB_A")));
        cells.push((9, FIXED_DURATION_COL as u32, CellValue::Number(42.0)));
        cells.push((10, 0, text("JOB_B")));
        cells.push((10, FIXED_START_COL as u32, CellValue::Number(45840.5)));
        cells.push((10, FIXED_END_COL as u32, CellValue::Number(45840.5 + 2.0 / 24.0)));
        let g = grid(&cells);

        let (jobs, report) = process_grid("fixed.xlsx", &g).unwrap();
        assert_eq!(report.strategy, Strategy::FixedRow);
        assert_eq!(report.header_row, Some(FIXED_HEADER_ROW));
        assert_eq!(report.summary.processed, 2);
        assert_eq!(jobs.analysis("JOB_A").unwrap().durations.avg, 42.0);
        let b = jobs.analysis("JOB_B").unwrap();
        assert!((b.durations.avg - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_negative_span_is_an_error_row() {
        let g = grid(&[
            (0, 0, text("Job")),
            (0, 1, text("Start Date")),
            (0, 2, text("End Date")),
            (1, 0, text("LATE")),
            (1, 1, text("2025-07-02 23:00:00")),
            (1, 2, text("2025-07-02 22:00:00")),
        ]);
        let (jobs, report) = process_grid("neg.xlsx", &g).unwrap();
        assert!(jobs.is_empty());
        assert_eq!(report.summary.errors, 1);
    }

    #[test]
    fn test_fallback_scan_layout() {
        let g = grid(&[
            (0, 0, text("Relatório de jobs")),
            (1, 0, text("BKP_DAILY")),
            (1, 3, text("65' 0''")),
            (2, 0, text("BKP_DAILY")),
            (2, 2, text("5' 30''")),
            (3, 0, text("CLEANUP")),
            (3, 1, text("0' 0''")),
        ]);
        let (jobs, report) = process_grid("scan.xlsx", &g).unwrap();
        assert_eq!(report.strategy, Strategy::FallbackScan);
        assert_eq!(report.header_row, None);
        assert_eq!(
            report.summary,
            RowSummary {
                total: 4,
                processed: 2,
                skipped: 1,
                errors: 1,
                unique_jobs: 1,
            }
        );
        let bkp = jobs.analysis("BKP_DAILY").unwrap();
        assert_eq!(bkp.total_executions, 2);
        assert_eq!(bkp.overdue_count, 1);
    }

    #[test]
    fn test_long_sheet_without_row_9_headers_is_scanned() {
        let mut cells = vec![(0, 0, text("Relatório de jobs"))];
        for row in 1..12 {
            cells.push((row, 0, text("BKP_DAILY")));
            cells.push((row, 2, text("75' 30''")));
        }
        let (jobs, report) = process_grid("long.xlsx", &grid(&cells)).unwrap();
        assert_eq!(report.strategy, Strategy::FallbackScan);
        assert_eq!(report.summary.processed, 11);
        assert_eq!(report.summary.skipped, 1);
        assert_eq!(report.summary.errors, 0);
        assert_eq!(jobs.analysis("BKP_DAILY").unwrap().total_executions, 11);
    }

    #[test]
    fn test_long_sheet_without_any_header_fails() {
        let cells: Vec<(u32, u32, CellValue)> = (0..12)
            .map(|row| (row, 0, text("sem cabeçalho")))
            .collect();
        let err = process_grid("noheader.xlsx", &grid(&cells)).unwrap_err();
        assert!(matches!(err, ReportError::MissingHeaderRow(_)));
    }

    #[test]
    fn test_row_9_data_is_not_a_header() {
        let row9_duration = CellValue::Number(42.0);
        let row9_start = text("2025-07-02 22:00:00");
        let job = text("JOB_A");
        let label = text("Start Time");
        let mut row: Vec<&CellValue> = vec![&job; FIXED_START_COL + 1];
        row[FIXED_DURATION_COL] = &row9_duration;
        row[FIXED_START_COL] = &row9_start;
        assert!(!has_fixed_headers(&row));

        row[FIXED_START_COL] = &label;
        assert!(has_fixed_headers(&row));
    }

    #[test]
    fn test_missing_header_row() {
        let g = grid(&[(0, 0, text("nothing")), (1, 0, text("useful"))]);
        let err = process_grid("plain.xlsx", &g).unwrap_err();
        match err {
            ReportError::MissingHeaderRow(msg) => assert!(msg.contains("plain.xlsx")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_workbook() {
        let path = PathBuf::from("empty.xlsx");
        let err = process_workbook(&path, &Workbook::default()).unwrap_err();
        assert!(matches!(err, ReportError::EmptyWorkbook(_)));
    }

    #[test]
    fn test_process_real_xlsx() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("overdue.xlsx");
        let mut book = rust_xlsxwriter::Workbook::new();
        let sheet = book.add_worksheet();
        sheet.write_string(0, 0, "Job Name").unwrap();
        sheet.write_string(0, 1, "Start Date").unwrap();
        sheet.write_string(0, 2, "End Date").unwrap();
        sheet.write_string(0, 3, "Duration").unwrap();
        sheet.write_string(1, 0, "A").unwrap();
        sheet.write_number(1, 3, 70.0).unwrap();
        sheet.write_string(2, 0, "A").unwrap();
        sheet.write_number(2, 3, 30.0).unwrap();
        sheet.write_string(3, 0, "B").unwrap();
        sheet.write_number(3, 3, 90.0).unwrap();
        book.save(&path).unwrap();

        let workbook = crate::reader::load_workbook(&path).unwrap();
        let (jobs, report) = process_workbook(&path, &workbook).unwrap();
        assert_eq!(report.summary.processed, 3);

        let overdue = jobs.overdue_stats();
        assert_eq!(overdue.len(), 2);
        assert_eq!((overdue[0].name.as_str(), overdue[0].overdue_count), ("A", 1));
        assert_eq!((overdue[1].name.as_str(), overdue[1].overdue_count), ("B", 1));
        let a = jobs.analysis("A").unwrap();
        assert_eq!((a.durations.avg, a.durations.min, a.durations.max), (50.0, 30.0, 70.0));
    }
}
