//! Sequential file batches for both tools.
//!
//! Files are read one at a time with `tokio::fs::read`; decoding and
//! extraction run synchronously between reads. A failing file is logged,
//! recorded and counted, and the batch moves on.

use std::path::{Path, PathBuf};

use report_core::error::{ReportError, Result};
use report_core::models::{CrqRecord, Workbook};
use report_core::time_utils::DateContext;
use report_data::aggregator::JobData;
use report_data::overdue::SheetReport;
use report_data::{crq, overdue, reader};
use serde::Serialize;

use crate::activity_log::ActivityLog;
use crate::chart_manager::ChartManager;

/// Read a file asynchronously and decode it.
pub async fn read_workbook(path: &Path) -> Result<Workbook> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ReportError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    reader::decode_workbook(path, bytes)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file_name: String,
    pub message: String,
}

// ── CRQ batch ─────────────────────────────────────────────────────────────────

/// A successfully extracted change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrqCard {
    /// File name without extension, used as the card title.
    pub file_stem: String,
    pub record: CrqRecord,
}

/// Result of a CRQ batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrqBatch {
    pub cards: Vec<CrqCard>,
    pub failures: Vec<FileFailure>,
}

impl CrqBatch {
    pub fn success_count(&self) -> usize {
        self.cards.len()
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }
}

/// Extract one change request per file.
pub async fn process_crq_files(
    paths: &[PathBuf],
    ctx: DateContext,
    log: &mut ActivityLog,
) -> CrqBatch {
    let mut batch = CrqBatch::default();

    for path in paths {
        let name = display_name(path);
        let outcome = match read_workbook(path).await {
            Ok(workbook) => crq::process_workbook(path, &workbook, ctx),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(record) => {
                log.info(format!("{name} processado com sucesso"));
                batch.cards.push(CrqCard {
                    file_stem: file_stem(path),
                    record,
                });
            }
            Err(e) => {
                log.error(format!("Erro ao processar {name}: {e}"));
                batch.failures.push(FileFailure {
                    file_name: name,
                    message: e.to_string(),
                });
            }
        }
    }

    log.info(format!(
        "{} arquivo(s) processado(s), {} erro(s)",
        batch.success_count(),
        batch.error_count()
    ));
    batch
}

// ── Overdue session ───────────────────────────────────────────────────────────

/// Per-file outcome of an overdue run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file_name: String,
    pub report: SheetReport,
}

/// State of the overdue report: selected files, the merged aggregate, the
/// charts built from it and the activity log.
#[derive(Debug)]
pub struct OverdueSession {
    files: Vec<PathBuf>,
    jobs: JobData,
    reports: Vec<FileReport>,
    failures: Vec<FileFailure>,
    charts: ChartManager,
    log: ActivityLog,
}

impl OverdueSession {
    pub fn new(log: ActivityLog) -> Self {
        Self {
            files: Vec::new(),
            jobs: JobData::new(),
            reports: Vec::new(),
            failures: Vec::new(),
            charts: ChartManager::new(),
            log,
        }
    }

    /// Replace the file selection.
    pub fn select_files(&mut self, files: Vec<PathBuf>) {
        self.log.info(format!("{} arquivos carregados", files.len()));
        self.files = files;
    }

    /// Process every selected file, merge the results and rebuild the charts.
    ///
    /// Each run starts from an empty aggregate.
    pub async fn run(&mut self) -> &JobData {
        self.jobs.clear();
        self.reports.clear();
        self.failures.clear();

        if self.files.is_empty() {
            self.log.error("Nenhum arquivo carregado");
            self.charts.clear();
            return &self.jobs;
        }

        for path in &self.files {
            let name = display_name(path);
            let outcome = match read_workbook(path).await {
                Ok(workbook) => overdue::process_workbook(path, &workbook),
                Err(e) => Err(e),
            };
            match outcome {
                Ok((jobs, report)) => {
                    self.log.info(format!(
                        "{name}: {} linhas processadas, {} ignoradas, {} erros ({})",
                        report.summary.processed,
                        report.summary.skipped,
                        report.summary.errors,
                        report.strategy
                    ));
                    self.jobs.merge(jobs);
                    self.reports.push(FileReport {
                        file_name: name,
                        report,
                    });
                }
                Err(e) => {
                    self.log.error(format!("Erro ao processar {name}: {e}"));
                    self.failures.push(FileFailure {
                        file_name: name,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.charts.render_all(&self.jobs);
        self.log.info("Processamento concluído");
        &self.jobs
    }

    /// Destroy the charts, empty both logs and drop the file selection.
    pub fn clear(&mut self) {
        self.charts.clear();
        self.log.clear();
        self.files.clear();
        self.jobs.clear();
        self.reports.clear();
        self.failures.clear();
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn jobs(&self) -> &JobData {
        &self.jobs
    }

    pub fn reports(&self) -> &[FileReport] {
        &self.reports
    }

    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    pub fn charts(&self) -> &ChartManager {
        &self.charts
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
