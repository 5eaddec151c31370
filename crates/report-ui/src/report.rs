//! Non-interactive output of the overdue report: a plain-text summary and
//! a JSON document carrying the three chart views plus the totals.

use serde::Serialize;

use report_core::formatting::{format_cv, format_duration};
use report_data::aggregator::{DetailedStats, DurationStat, JobData, OverdueStat, VariationStat};
use report_runtime::batch::{FileFailure, FileReport, OverdueSession};

/// Snapshot of a finished overdue run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
    pub overdue: Vec<OverdueStat>,
    pub durations: Vec<DurationStat>,
    pub variation: Vec<VariationStat>,
    pub totals: DetailedStats,
}

impl OverdueReport {
    pub fn new(files: Vec<FileReport>, failures: Vec<FileFailure>, jobs: &JobData) -> Self {
        Self {
            files,
            failures,
            overdue: jobs.overdue_stats(),
            durations: jobs.duration_stats(),
            variation: jobs.variation_stats(),
            totals: jobs.detailed_stats(),
        }
    }

    pub fn from_session(session: &OverdueSession) -> Self {
        Self::new(
            session.reports().to_vec(),
            session.failures().to_vec(),
            session.jobs(),
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report with one section per view.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Arquivos\n");
        for f in &self.files {
            out.push_str(&format!(
                "  {}: {} processadas, {} ignoradas, {} erros ({})\n",
                f.file_name,
                f.report.summary.processed,
                f.report.summary.skipped,
                f.report.summary.errors,
                f.report.strategy
            ));
        }
        for f in &self.failures {
            out.push_str(&format!("  {}: ERRO {}\n", f.file_name, f.message));
        }

        out.push_str(&format!(
            "\nTotal: {} jobs, {} execuções, {} jobs com overdue, {} overdues\n",
            self.totals.total_jobs,
            self.totals.total_executions,
            self.totals.jobs_with_overdue,
            self.totals.total_overdues
        ));

        out.push_str("\nJobs em Overdue (>60min)\n");
        if self.overdue.is_empty() {
            out.push_str("  nenhum\n");
        }
        for s in &self.overdue {
            out.push_str(&format!(
                "  {:<32} {:>4} de {:<4} {:>6.1}%  média {}\n",
                s.name,
                s.overdue_count,
                s.total_executions,
                s.overdue_percentage,
                format_duration(s.avg_duration)
            ));
        }

        out.push_str("\nDuração Média dos Jobs\n");
        for s in &self.durations {
            out.push_str(&format!(
                "  {:<32} {:>10}  mín {}  máx {}  ({} execuções)\n",
                s.name,
                format_duration(s.avg),
                format_duration(s.min),
                format_duration(s.max),
                s.execution_count
            ));
        }

        out.push_str("\nVariação de Duração dos Jobs\n");
        for s in &self.variation {
            out.push_str(&format!(
                "  {:<32} CV {:>8}  desvio {}  ({} execuções)\n",
                s.name,
                format_cv(s.cv),
                format_duration(s.std_dev),
                s.execution_count
            ));
        }
        out
    }
}
