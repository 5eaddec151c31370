//! Label search over form-style sheets.
//!
//! Change-request forms put each answer next to a free-text label. The
//! locator finds those labels by case-insensitive substring match and the
//! value reader picks the neighbouring cell.

use std::collections::BTreeMap;

use report_core::models::{CellGrid, CellValue, FieldKey, HeaderLocation};
use tracing::debug;

/// Candidate label substrings per field, in the order fields are tested.
pub const FIELD_LABELS: &[(FieldKey, &[&str])] = &[
    (FieldKey::StartTime, &["início", "inicio"]),
    (FieldKey::EndTime, &["término", "termino"]),
    (FieldKey::ScopeDescription, &["escopo da manutenção:"]),
    (FieldKey::Impact, &["impactos", "impactos da manutenção"]),
    (
        FieldKey::AffectedArea,
        &["área afetada", "area afetada", "empresa afetada"],
    ),
    (
        FieldKey::ResponsibleParty,
        &["responsável", "responsavel", "analista responsável"],
    ),
];

/// Located fields of one sheet. Unmatched fields are absent.
pub type HeaderLocations = BTreeMap<FieldKey, HeaderLocation>;

/// Lower-cased, trimmed text of a filled-in cell.
pub fn label_text(value: &CellValue) -> Option<String> {
    value.display_text().map(|s| s.to_lowercase().trim().to_string())
}

/// Scan `grid` row by row and record the first cell matching each field.
///
/// A cell is claimed by at most one field: the first field in
/// [`FIELD_LABELS`] that is still unlocated and has a matching label.
pub fn find_header_locations(grid: &CellGrid) -> HeaderLocations {
    let mut locations = HeaderLocations::new();

    for (row, col, value) in grid.cells() {
        if locations.len() == FIELD_LABELS.len() {
            break;
        }
        let Some(text) = label_text(value) else {
            continue;
        };

        for (field, labels) in FIELD_LABELS {
            if locations.contains_key(field) {
                continue;
            }
            if labels.iter().any(|label| text.contains(label)) {
                let location = HeaderLocation::new(row, col);
                debug!(
                    field = %field,
                    address = %location.address,
                    value = %text,
                    "header located"
                );
                locations.insert(*field, location);
                break;
            }
        }
    }

    locations
}

/// Read the answer next to a located label.
///
/// The right-hand cell wins, then the one below. Responsible-party forms
/// list the name under the label, so that field reads below first.
/// Returns `""` when the field was not located or both neighbours are blank.
pub fn value_near(grid: &CellGrid, location: Option<&HeaderLocation>, field: FieldKey) -> String {
    let Some(loc) = location else {
        debug!(field = %field, "no location found");
        return String::new();
    };

    let right = grid.value_text(loc.row, loc.col + 1);
    let below = grid.value_text(loc.row + 1, loc.col);
    debug!(field = %field, ?right, ?below, "neighbour values");

    let picked = if field == FieldKey::ResponsibleParty {
        below.or(right)
    } else {
        right.or(below)
    };
    picked.unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
