//! Chart registry for the overdue report.
//!
//! [`ChartManager`] owns every live chart keyed by [`ChartId`]. Creating a
//! chart under an id that is already present destroys the old one first,
//! so at most one chart exists per id.

use std::collections::BTreeMap;

use report_core::formatting::{format_cv, format_duration};
use report_data::aggregator::{DurationStat, JobData, OverdueStat, VariationStat};
use serde::Serialize;

// ── Ids ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ChartId {
    #[serde(rename = "overdueChart")]
    Overdue,
    #[serde(rename = "durationChart")]
    Duration,
    #[serde(rename = "variationChart")]
    Variation,
}

impl ChartId {
    /// Display order of the charts.
    pub const ALL: [ChartId; 3] = [ChartId::Overdue, ChartId::Duration, ChartId::Variation];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartId::Overdue => "overdueChart",
            ChartId::Duration => "durationChart",
            ChartId::Variation => "variationChart",
        }
    }

    /// The chart after this one, wrapping around.
    pub fn next(self) -> Self {
        match self {
            ChartId::Overdue => ChartId::Duration,
            ChartId::Duration => ChartId::Variation,
            ChartId::Variation => ChartId::Overdue,
        }
    }
}

impl std::fmt::Display for ChartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Specs ─────────────────────────────────────────────────────────────────────

/// One bar with the lines shown when it is selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub tooltip: Vec<String>,
}

/// Everything needed to draw a bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub dataset_label: String,
    pub y_axis_label: String,
    pub bars: Vec<Bar>,
}

/// A live chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartHandle {
    pub id: ChartId,
    /// Bumped on every create, so a replaced chart is distinguishable.
    pub revision: u64,
    pub spec: ChartSpec,
}

pub fn overdue_chart(stats: &[OverdueStat]) -> ChartSpec {
    ChartSpec {
        title: "Jobs em Overdue (>60min)".to_string(),
        dataset_label: "Quantidade de Overdue".to_string(),
        y_axis_label: "Número de Ocorrências".to_string(),
        bars: stats
            .iter()
            .map(|s| Bar {
                label: s.name.clone(),
                value: s.overdue_count as f64,
                tooltip: vec![
                    format!("Overdue: {}", s.overdue_count),
                    format!("Total Execuções: {}", s.total_executions),
                    format!("Percentual: {:.1}%", s.overdue_percentage),
                    format!("Duração Média: {}", format_duration(s.avg_duration)),
                ],
            })
            .collect(),
    }
}

pub fn duration_chart(stats: &[DurationStat]) -> ChartSpec {
    ChartSpec {
        title: "Duração Média dos Jobs".to_string(),
        dataset_label: "Duração Média".to_string(),
        y_axis_label: "Duração (minutos)".to_string(),
        bars: stats
            .iter()
            .map(|s| Bar {
                label: s.name.clone(),
                value: s.avg,
                tooltip: vec![
                    format!("Média: {}", format_duration(s.avg)),
                    format!("Mín: {}", format_duration(s.min)),
                    format!("Máx: {}", format_duration(s.max)),
                    format!("Execuções: {}", s.execution_count),
                ],
            })
            .collect(),
    }
}

pub fn variation_chart(stats: &[VariationStat]) -> ChartSpec {
    ChartSpec {
        title: "Variação de Duração dos Jobs".to_string(),
        dataset_label: "Coeficiente de Variação".to_string(),
        y_axis_label: "Variação (%)".to_string(),
        bars: stats
            .iter()
            .map(|s| Bar {
                label: s.name.clone(),
                value: s.cv.unwrap_or(0.0),
                tooltip: vec![
                    format!("CV: {}", format_cv(s.cv)),
                    format!("Média: {}", format_duration(s.avg_duration)),
                    format!("Desvio Padrão: {}", format_duration(s.std_dev)),
                    format!("Execuções: {}", s.execution_count),
                    format!("Min: {}", format_duration(s.min_duration)),
                    format!("Max: {}", format_duration(s.max_duration)),
                ],
            })
            .collect(),
    }
}

// ── ChartManager ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ChartManager {
    charts: BTreeMap<ChartId, ChartHandle>,
    revision: u64,
}

impl ChartManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the chart `id`, destroying any existing chart with that id.
    pub fn create(&mut self, id: ChartId, spec: ChartSpec) -> &ChartHandle {
        if self.destroy(id) {
            tracing::debug!(chart = %id, "replaced existing chart");
        }
        self.revision += 1;
        tracing::debug!(chart = %id, bars = spec.bars.len(), "chart created");
        self.charts.entry(id).or_insert(ChartHandle {
            id,
            revision: self.revision,
            spec,
        })
    }

    /// Destroy chart `id`; `false` when there was none.
    pub fn destroy(&mut self, id: ChartId) -> bool {
        self.charts.remove(&id).is_some()
    }

    /// Destroy every chart.
    pub fn clear(&mut self) {
        self.charts.clear();
    }

    pub fn get(&self, id: ChartId) -> Option<&ChartHandle> {
        self.charts.get(&id)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Build all three charts from an aggregate.
    pub fn render_all(&mut self, jobs: &JobData) {
        self.create(ChartId::Overdue, overdue_chart(&jobs.overdue_stats()));
        self.create(ChartId::Duration, duration_chart(&jobs.duration_stats()));
        self.create(ChartId::Variation, variation_chart(&jobs.variation_stats()));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn jobs() -> JobData {
        let mut data = JobData::new();
        data.add_job("A", 70.0, None, None);
        data.add_job("A", 30.0, None, None);
        data.add_job("B", 90.0, None, None);
        data
    }

    fn spec(title: &str) -> ChartSpec {
        ChartSpec {
            title: title.to_string(),
            dataset_label: String::new(),
            y_axis_label: String::new(),
            bars: Vec::new(),
        }
    }

    #[test]
    fn test_create_replaces_same_id() {
        let mut mgr = ChartManager::new();
        let first = mgr.create(ChartId::Overdue, spec("one")).revision;
        let second = mgr.create(ChartId::Overdue, spec("two")).revision;
        assert_eq!(mgr.len(), 1);
        assert!(second > first);
        assert_eq!(mgr.get(ChartId::Overdue).unwrap().spec.title, "two");
    }

    #[test]
    fn test_destroy_and_clear() {
        let mut mgr = ChartManager::new();
        mgr.render_all(&jobs());
        assert_eq!(mgr.len(), 3);
        assert!(mgr.destroy(ChartId::Duration));
        assert!(!mgr.destroy(ChartId::Duration));
        mgr.clear();
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_overdue_chart_tooltips() {
        let chart = overdue_chart(&jobs().overdue_stats());
        assert_eq!(chart.bars.len(), 2);
        assert_eq!(chart.bars[0].label, "A");
        assert_eq!(chart.bars[0].value, 1.0);
        assert_eq!(
            chart.bars[0].tooltip,
            vec![
                "Overdue: 1".to_string(),
                "Total Execuções: 2".to_string(),
                "Percentual: 50.0%".to_string(),
                "Duração Média: 50min".to_string(),
            ]
        );
    }

    #[test]
    fn test_duration_chart_order() {
        let chart = duration_chart(&jobs().duration_stats());
        let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A"]);
        assert_eq!(chart.bars[0].tooltip[0], "Média: 1h 30min");
    }

    #[test]
    fn test_variation_chart_undefined_cv() {
        let mut data = JobData::new();
        data.add_job("A", 70.0, None, None);
        data.add_job("A", 30.0, None, None);
        let chart = variation_chart(&data.variation_stats());
        assert_eq!(chart.bars[0].tooltip[0], "CV: 40.00%");

        let stat = VariationStat {
            name: "Z".into(),
            cv: None,
            avg_duration: 0.0,
            std_dev: 0.0,
            execution_count: 1,
            min_duration: 0.0,
            max_duration: 0.0,
        };
        let chart = variation_chart(&[stat]);
        assert_eq!(chart.bars[0].value, 0.0);
        assert_eq!(chart.bars[0].tooltip[0], "CV: N/A");
    }

    #[test]
    fn test_chart_id_cycle() {
        assert_eq!(ChartId::Overdue.next(), ChartId::Duration);
        assert_eq!(ChartId::Variation.next(), ChartId::Overdue);
        assert_eq!(ChartId::Variation.to_string(), "variationChart");
    }
}
