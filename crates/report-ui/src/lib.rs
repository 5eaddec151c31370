//! Presentation layer for sheet-report.
//!
//! Themes, the HTML page of CRQ cards, the ratatui chart and log views, the
//! plain-text and JSON overdue reports, and the interactive event loop.

pub mod app;
pub mod chart_view;
pub mod html;
pub mod log_view;
pub mod report;
pub mod themes;

pub use report_core as core;
