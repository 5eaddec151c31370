//! Core types for sheet-report.
//!
//! Cell grids and extracted records, the error taxonomy, time/date/duration
//! normalisation, duration statistics, display formatting and the CLI
//! settings shared by every other crate in the workspace.

pub mod calculations;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
