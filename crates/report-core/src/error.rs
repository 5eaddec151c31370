use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sheet-report crates.
///
/// Field-not-found and unparseable values are deliberately absent: those
/// yield empty strings or zero durations and never surface as errors.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes of a file could not be decoded as a workbook.
    #[error("Failed to decode workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// The workbook has no sheets, or its first sheet has no cells.
    #[error("Workbook has no usable sheet: {0}")]
    EmptyWorkbook(PathBuf),

    /// No header row could be located by any strategy.
    #[error("Header row not found: {0}")]
    MissingHeaderRow(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ReportError::FileRead {
            path: PathBuf::from("/some/crq.xlsx"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/crq.xlsx"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_workbook() {
        let err = ReportError::Workbook {
            path: PathBuf::from("broken.xlsx"),
            message: "invalid zip header".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to decode workbook broken.xlsx: invalid zip header"
        );
    }

    #[test]
    fn test_error_display_empty_workbook() {
        let err = ReportError::EmptyWorkbook(PathBuf::from("empty.xlsx"));
        assert_eq!(err.to_string(), "Workbook has no usable sheet: empty.xlsx");
    }

    #[test]
    fn test_error_display_missing_header_row() {
        let err = ReportError::MissingHeaderRow("jobs.xlsx".to_string());
        assert_eq!(err.to_string(), "Header row not found: jobs.xlsx");
    }

    #[test]
    fn test_error_display_config() {
        let err = ReportError::Config("unknown theme".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown theme");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ReportError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: ReportError = anyhow::anyhow!("zip central directory missing").into();
        assert_eq!(err.to_string(), "zip central directory missing");
    }
}
