//! Spreadsheet discovery and decoding.
//!
//! Expands command-line paths into spreadsheet files and decodes workbook
//! bytes with [`calamine`] into the [`CellGrid`] model used by both tools.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::NaiveDateTime;
use report_core::error::{ReportError, Result};
use report_core::models::{CellGrid, CellValue, Workbook};
use tracing::{debug, warn};

/// File extensions treated as spreadsheets when walking directories.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

// ── Discovery ─────────────────────────────────────────────────────────────────

/// `true` when `path` carries one of [`SPREADSHEET_EXTENSIONS`].
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SPREADSHEET_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Find all spreadsheet files recursively under `dir`, sorted by path.
///
/// Office lock files (`~$name.xlsx`) are skipped.
pub fn find_spreadsheet_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Data path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && is_spreadsheet(entry.path())
                && !entry.file_name().to_string_lossy().starts_with("~$")
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand command-line inputs: directories become the spreadsheets beneath
/// them, anything else is kept as given so a missing file is reported by
/// the batch that reads it.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = find_spreadsheet_files(input);
            if found.is_empty() {
                warn!("No spreadsheet files found in {}", input.display());
            }
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    debug!(inputs = inputs.len(), files = files.len(), "expanded input paths");
    files
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decode the first sheet of a spreadsheet file into a [`Workbook`].
///
/// The format is detected from the content, so `path` is only used for
/// error messages. Later sheets are never read.
pub fn decode_workbook(path: &Path, bytes: Vec<u8>) -> Result<Workbook> {
    let mut sheets = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        ReportError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    let mut workbook = Workbook::default();
    let Some(name) = sheets.sheet_names().first().cloned() else {
        return Ok(workbook);
    };

    let range = sheets
        .worksheet_range(&name)
        .map_err(|e| ReportError::Workbook {
            path: path.to_path_buf(),
            message: format!("failed to read sheet '{}': {}", name, e),
        })?;
    let grid = grid_from_range(&range);
    debug!(
        file = %path.display(),
        sheet = %name,
        rows = grid.row_count(),
        "decoded sheet"
    );
    workbook.sheets.push((name, grid));

    Ok(workbook)
}

/// Read and decode a workbook synchronously.
pub fn load_workbook(path: &Path) -> Result<Workbook> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    decode_workbook(path, bytes)
}

/// Convert a calamine range into a sparse grid with absolute coordinates.
pub fn grid_from_range(range: &Range<Data>) -> CellGrid {
    let mut grid = CellGrid::new();
    let (Some((start_row, start_col)), Some((end_row, end_col))) = (range.start(), range.end())
    else {
        return grid;
    };
    grid.extend_range(start_row, start_col, end_row, end_col);

    for (row_idx, row) in range.rows().enumerate() {
        let row_no = start_row + row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let value = cell_value(cell);
            if value != CellValue::Empty {
                grid.set(row_no, start_col + col_idx as u32, value);
            }
        }
    }
    grid
}

/// Map one calamine cell onto [`CellValue`].
///
/// Excel date/time cells keep their serial; ISO datetimes become
/// [`CellValue::DateTime`] when they parse.
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
