//! Runtime layer for sheet-report.
//!
//! Runs file batches sequentially, keeps the activity log and owns the
//! charts built from the merged job aggregate.

pub mod activity_log;
pub mod batch;
pub mod chart_manager;

pub use report_core as core;
pub use report_data as data;
