use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── CellValue ─────────────────────────────────────────────────────────────────

/// A single scalar read from a spreadsheet cell.
///
/// Excel stores dates and times as serial numbers; those arrive here as
/// [`CellValue::Number`].  Only formats that carry real datetimes (ODS,
/// ISO strings decoded by the reader) produce [`CellValue::DateTime`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Convenience constructor used heavily in tests and by the reader.
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// `true` for values a spreadsheet user would consider "filled in":
    /// non-empty text, non-zero numbers, `true`, and datetimes.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Bool(b) => *b,
            CellValue::DateTime(_) => true,
        }
    }

    /// Display text of a truthy value, `None` otherwise.
    ///
    /// Whole numbers render without a fractional part (`45`, not `45.0`).
    pub fn display_text(&self) -> Option<String> {
        if !self.is_truthy() {
            return None;
        }
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format!("{}", n)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            CellValue::Empty => None,
        }
    }

    /// The text payload, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

// ── CellGrid ──────────────────────────────────────────────────────────────────

/// Inclusive rectangle of a sheet's declared range, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

/// A sparse, rectangular grid of cell values.
///
/// Only non-empty cells are stored.  Iteration over [`CellGrid::cells`]
/// is row-major because the backing map is keyed by `(row, col)`.
#[derive(Debug, Clone, Default)]
pub struct CellGrid {
    cells: BTreeMap<(u32, u32), CellValue>,
    range: Option<GridRange>,
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from `(row, col, value)` triples.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32, CellValue)>,
    {
        let mut grid = Self::new();
        for (row, col, value) in cells {
            grid.set(row, col, value);
        }
        grid
    }

    /// Store `value` at `(row, col)`, growing the declared range to cover it.
    ///
    /// Empty values still grow the range but are not stored.
    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.extend_range(row, col, row, col);
        if value != CellValue::Empty {
            self.cells.insert((row, col), value);
        } else {
            self.cells.remove(&(row, col));
        }
    }

    /// Grow the declared range so it covers the given rectangle.
    pub fn extend_range(&mut self, start_row: u32, start_col: u32, end_row: u32, end_col: u32) {
        self.range = Some(match self.range {
            None => GridRange {
                start_row,
                start_col,
                end_row,
                end_col,
            },
            Some(r) => GridRange {
                start_row: r.start_row.min(start_row),
                start_col: r.start_col.min(start_col),
                end_row: r.end_row.max(end_row),
                end_col: r.end_col.max(end_col),
            },
        });
    }

    /// Declared range, `None` for a sheet with no cells at all.
    pub fn range(&self) -> Option<GridRange> {
        self.range
    }

    /// Value at `(row, col)`; absent cells read as [`CellValue::Empty`].
    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY_CELL)
    }

    /// Display text at `(row, col)` when the cell holds a truthy value.
    pub fn value_text(&self, row: u32, col: u32) -> Option<String> {
        self.get(row, col).display_text()
    }

    /// Dense row view from row 0 and column 0 to the end of the range.
    ///
    /// Absent cells appear as [`CellValue::Empty`], so column indices line
    /// up with spreadsheet columns (`A` = 0).
    pub fn rows(&self) -> Vec<Vec<&CellValue>> {
        let Some(range) = self.range else {
            return Vec::new();
        };
        (0..=range.end_row)
            .map(|r| (0..=range.end_col).map(|c| self.get(r, c)).collect())
            .collect()
    }

    /// Non-empty cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    /// `true` when no non-empty cell is stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of rows covered by the declared range, counted from row 0.
    pub fn row_count(&self) -> u32 {
        self.range.map(|r| r.end_row + 1).unwrap_or(0)
    }
}

/// A decoded workbook: named sheets in file order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<(String, CellGrid)>,
}

impl Workbook {
    /// The first sheet, which is the only one either tool looks at.
    pub fn first_sheet(&self) -> Option<(&str, &CellGrid)> {
        self.sheets.first().map(|(name, grid)| (name.as_str(), grid))
    }
}

// ── Header locations ──────────────────────────────────────────────────────────

/// Semantic fields of a change-request form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKey {
    StartTime,
    EndTime,
    ScopeDescription,
    Impact,
    AffectedArea,
    ResponsibleParty,
}

impl FieldKey {
    /// Kebab-case identifier, as used in logs and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::StartTime => "start-time",
            FieldKey::EndTime => "end-time",
            FieldKey::ScopeDescription => "scope-description",
            FieldKey::Impact => "impact",
            FieldKey::AffectedArea => "affected-area",
            FieldKey::ResponsibleParty => "responsible-party",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a field's label was found on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderLocation {
    pub row: u32,
    pub col: u32,
    /// A1-style reference, e.g. `"D3"`.
    pub address: String,
}

impl HeaderLocation {
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            address: cell_address(row, col),
        }
    }
}

/// Convert zero-based `(row, col)` into an A1-style reference.
pub fn cell_address(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    let col_str: String = letters.into_iter().rev().collect();
    format!("{}{}", col_str, row + 1)
}

// ── Extracted records ─────────────────────────────────────────────────────────

/// Fields scraped from one change-request spreadsheet.
///
/// Every field is an empty string when it could not be located.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrqRecord {
    pub start_time: String,
    pub start_date: String,
    pub end_time: String,
    pub end_date: String,
    pub scope_description: String,
    pub impact: String,
    pub affected_area: String,
    pub responsible_party: String,
}

/// One row of a scheduler export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobExecution {
    pub job_name: String,
    /// Execution time in minutes; always positive once accepted.
    pub duration: f64,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!CellValue::Empty.is_truthy());
        assert!(!CellValue::text("").is_truthy());
        assert!(!CellValue::Number(0.0).is_truthy());
        assert!(!CellValue::Bool(false).is_truthy());
        assert!(CellValue::text("x").is_truthy());
        assert!(CellValue::Number(0.5).is_truthy());
    }

    #[test]
    fn test_display_text_whole_number() {
        assert_eq!(CellValue::Number(45.0).display_text().as_deref(), Some("45"));
        assert_eq!(CellValue::Number(0.25).display_text().as_deref(), Some("0.25"));
        assert_eq!(CellValue::Number(0.0).display_text(), None);
    }

    #[test]
    fn test_as_text_only_for_text() {
        assert_eq!(CellValue::text("CRQ1").as_text(), Some("CRQ1"));
        assert_eq!(CellValue::Number(42.0).as_text(), None);
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_grid_get_absent_is_empty() {
        let grid = CellGrid::from_cells([(1, 1, CellValue::text("a"))]);
        assert_eq!(grid.get(0, 0), &CellValue::Empty);
        assert_eq!(grid.get(1, 1), &CellValue::text("a"));
    }

    #[test]
    fn test_grid_range_grows() {
        let mut grid = CellGrid::new();
        assert!(grid.range().is_none());
        grid.set(2, 3, CellValue::Number(1.0));
        grid.set(0, 5, CellValue::Empty);
        let r = grid.range().unwrap();
        assert_eq!((r.start_row, r.start_col, r.end_row, r.end_col), (0, 3, 2, 5));
        assert_eq!(grid.row_count(), 3);
    }

    #[test]
    fn test_grid_cells_row_major() {
        let grid = CellGrid::from_cells([
            (1, 0, CellValue::text("c")),
            (0, 2, CellValue::text("b")),
            (0, 1, CellValue::text("a")),
        ]);
        let order: Vec<(u32, u32)> = grid.cells().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 1), (0, 2), (1, 0)]);
    }

    #[test]
    fn test_grid_rows_dense_from_origin() {
        let grid = CellGrid::from_cells([(1, 2, CellValue::text("x"))]);
        let rows = grid.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][0], &CellValue::Empty);
        assert_eq!(rows[1][2], &CellValue::text("x"));
        assert!(CellGrid::new().rows().is_empty());
    }

    #[test]
    fn test_grid_value_text() {
        let grid = CellGrid::from_cells([
            (0, 0, CellValue::text("Equipe")),
            (0, 1, CellValue::Number(0.0)),
        ]);
        assert_eq!(grid.value_text(0, 0).as_deref(), Some("Equipe"));
        assert_eq!(grid.value_text(0, 1), None);
        assert_eq!(grid.value_text(5, 5), None);
    }

    #[test]
    fn test_cell_address() {
        assert_eq!(cell_address(0, 0), "A1");
        assert_eq!(cell_address(2, 3), "D3");
        assert_eq!(cell_address(9, 25), "Z10");
        assert_eq!(cell_address(0, 26), "AA1");
        assert_eq!(cell_address(0, 27), "AB1");
    }

    #[test]
    fn test_field_key_serde_kebab() {
        let json = serde_json::to_string(&FieldKey::ResponsibleParty).unwrap();
        assert_eq!(json, "\"responsible-party\"");
        assert_eq!(FieldKey::AffectedArea.to_string(), "affected-area");
    }
}
