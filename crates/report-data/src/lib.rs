//! Spreadsheet ingestion for sheet-report.
//!
//! Finds and decodes workbook files, locates labelled fields on change
//! request forms, reads scheduler exports and aggregates job durations.

pub mod aggregator;
pub mod crq;
pub mod locator;
pub mod overdue;
pub mod reader;

pub use report_core as core;
