//! Per-job aggregation of execution durations.
//!
//! [`JobData`] collects accepted executions keyed by trimmed job name and
//! projects them into the three report views (overdue counts, mean
//! duration, variation) plus a detailed summary.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use report_core::calculations::{cmp_cv_desc, is_overdue, DurationStats};
use report_core::models::JobExecution;
use serde::Serialize;
use tracing::warn;

// ── Records ───────────────────────────────────────────────────────────────────

/// One accepted execution of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub duration: f64,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
struct JobEntry {
    name: String,
    durations: Vec<f64>,
    overdue_count: u32,
    executions: Vec<ExecutionRecord>,
}

impl JobEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            durations: Vec::new(),
            overdue_count: 0,
            executions: Vec::new(),
        }
    }

    fn push(&mut self, record: ExecutionRecord) {
        if is_overdue(record.duration) {
            self.overdue_count += 1;
        }
        self.durations.push(record.duration);
        self.executions.push(record);
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// Everything known about one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobAnalysis {
    pub total_executions: usize,
    pub overdue_count: u32,
    pub durations: DurationStats,
    pub executions: Vec<ExecutionRecord>,
}

/// Row of the overdue-count view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueStat {
    pub name: String,
    pub overdue_count: u32,
    pub total_executions: usize,
    pub overdue_percentage: f64,
    pub avg_duration: f64,
}

/// Row of the mean-duration view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStat {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub std_dev: f64,
    pub cv: Option<f64>,
    pub execution_count: usize,
}

/// Row of the variation view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariationStat {
    pub name: String,
    pub cv: Option<f64>,
    pub avg_duration: f64,
    pub std_dev: f64,
    pub execution_count: usize,
    pub min_duration: f64,
    pub max_duration: f64,
}

/// Per-job line of [`DetailedStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub job_name: String,
    pub executions: usize,
    pub avg_duration: f64,
    pub variation: Option<f64>,
}

/// Totals over the whole aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailedStats {
    pub total_jobs: usize,
    pub total_executions: usize,
    pub jobs_with_overdue: usize,
    pub total_overdues: u32,
    pub executions_per_job: Vec<JobSummary>,
}

// ── JobData ───────────────────────────────────────────────────────────────────

/// Aggregate of job executions, in first-seen job order.
///
/// The report views are read-only projections. Overdue ties keep the order
/// in which each job first ran overdue; the other views keep first-seen order.
#[derive(Debug, Clone, Default)]
pub struct JobData {
    jobs: Vec<JobEntry>,
    index: HashMap<String, usize>,
    /// Job indices in order of their first overdue run.
    overdue_order: Vec<usize>,
}

impl JobData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one execution. Returns `false` (and logs) when the name is
    /// blank or the duration is not positive.
    pub fn add_job(
        &mut self,
        job_name: &str,
        duration: f64,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> bool {
        let name = job_name.trim();
        if name.is_empty() || duration.is_nan() || duration <= 0.0 {
            warn!(job = %name, duration, "invalid job execution ignored");
            return false;
        }
        let idx = self.entry_index(name);
        self.record(
            idx,
            ExecutionRecord {
                duration,
                start,
                end,
            },
        );
        true
    }

    /// [`JobData::add_job`] for an already parsed row.
    pub fn add_execution(&mut self, execution: &JobExecution) -> bool {
        self.add_job(
            &execution.job_name,
            execution.duration,
            execution.start,
            execution.end,
        )
    }

    fn entry_index(&mut self, name: &str) -> usize {
        match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.jobs.push(JobEntry::new(name.to_string()));
                self.index.insert(name.to_string(), self.jobs.len() - 1);
                self.jobs.len() - 1
            }
        }
    }

    fn record(&mut self, idx: usize, record: ExecutionRecord) {
        let entry = &mut self.jobs[idx];
        let was_overdue = entry.overdue_count > 0;
        entry.push(record);
        if !was_overdue && entry.overdue_count > 0 {
            self.overdue_order.push(idx);
        }
    }

    /// Number of distinct jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Job names in first-seen order.
    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|j| j.name.as_str())
    }

    /// Full analysis of one job, `None` if it was never seen.
    pub fn analysis(&self, job_name: &str) -> Option<JobAnalysis> {
        let entry = &self.jobs[*self.index.get(job_name.trim())?];
        Self::analyse(entry)
    }

    fn analyse(entry: &JobEntry) -> Option<JobAnalysis> {
        Some(JobAnalysis {
            total_executions: entry.durations.len(),
            overdue_count: entry.overdue_count,
            durations: DurationStats::from_durations(&entry.durations)?,
            executions: entry.executions.clone(),
        })
    }

    fn analyses(&self) -> impl Iterator<Item = (&str, JobAnalysis)> {
        self.jobs
            .iter()
            .filter_map(|entry| Self::analyse(entry).map(|a| (entry.name.as_str(), a)))
    }

    /// Jobs with at least one overdue run, most overdue first. Equal counts
    /// keep the order in which the jobs first ran overdue.
    pub fn overdue_stats(&self) -> Vec<OverdueStat> {
        let mut stats: Vec<OverdueStat> = self
            .overdue_order
            .iter()
            .map(|&idx| &self.jobs[idx])
            .filter_map(|entry| Self::analyse(entry).map(|a| (entry.name.as_str(), a)))
            .map(|(name, a)| OverdueStat {
                name: name.to_string(),
                overdue_count: a.overdue_count,
                total_executions: a.total_executions,
                overdue_percentage: a.overdue_count as f64 / a.total_executions as f64 * 100.0,
                avg_duration: a.durations.avg,
            })
            .collect();
        stats.sort_by(|a, b| b.overdue_count.cmp(&a.overdue_count));
        stats
    }

    /// All jobs, longest mean duration first.
    pub fn duration_stats(&self) -> Vec<DurationStat> {
        let mut stats: Vec<DurationStat> = self
            .analyses()
            .map(|(name, a)| DurationStat {
                name: name.to_string(),
                min: a.durations.min,
                max: a.durations.max,
                avg: a.durations.avg,
                std_dev: a.durations.std_dev,
                cv: a.durations.cv,
                execution_count: a.total_executions,
            })
            .collect();
        stats.sort_by(|a, b| b.avg.partial_cmp(&a.avg).unwrap_or(std::cmp::Ordering::Equal));
        stats
    }

    /// All jobs, highest coefficient of variation first; undefined CVs last.
    pub fn variation_stats(&self) -> Vec<VariationStat> {
        let mut stats: Vec<VariationStat> = self
            .analyses()
            .map(|(name, a)| VariationStat {
                name: name.to_string(),
                cv: a.durations.cv,
                avg_duration: a.durations.avg,
                std_dev: a.durations.std_dev,
                execution_count: a.total_executions,
                min_duration: a.durations.min,
                max_duration: a.durations.max,
            })
            .collect();
        stats.sort_by(|a, b| cmp_cv_desc(a.cv, b.cv));
        stats
    }

    /// Totals across all jobs.
    pub fn detailed_stats(&self) -> DetailedStats {
        let mut stats = DetailedStats {
            total_jobs: self.jobs.len(),
            ..Default::default()
        };
        for (name, a) in self.analyses() {
            stats.total_executions += a.total_executions;
            if a.overdue_count > 0 {
                stats.jobs_with_overdue += 1;
                stats.total_overdues += a.overdue_count;
            }
            stats.executions_per_job.push(JobSummary {
                job_name: name.to_string(),
                executions: a.total_executions,
                avg_duration: a.durations.avg,
                variation: a.durations.cv,
            });
        }
        stats
    }

    /// Fold a per-file aggregate into this one. Jobs new to `self` are
    /// appended in `other`'s order, and jobs that first run overdue in
    /// `other` follow `other`'s overdue order.
    pub fn merge(&mut self, other: JobData) {
        let mut mapped = Vec::with_capacity(other.jobs.len());
        for job in other.jobs {
            let idx = self.entry_index(&job.name);
            let entry = &mut self.jobs[idx];
            let was_overdue = entry.overdue_count > 0;
            for record in job.executions {
                entry.push(record);
            }
            mapped.push((idx, was_overdue));
        }
        for other_idx in other.overdue_order {
            let (idx, was_overdue) = mapped[other_idx];
            if !was_overdue {
                self.overdue_order.push(idx);
            }
        }
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
        self.index.clear();
        self.overdue_order.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
