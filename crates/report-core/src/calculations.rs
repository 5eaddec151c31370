use serde::Serialize;

/// Executions longer than this many minutes count as overdue.
pub const OVERDUE_THRESHOLD_MINUTES: f64 = 60.0;

/// Whether a single execution ran overdue.
pub fn is_overdue(duration_minutes: f64) -> bool {
    duration_minutes > OVERDUE_THRESHOLD_MINUTES
}

// ── DurationStats ─────────────────────────────────────────────────────────────

/// Descriptive statistics over one job's execution durations (minutes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Population standard deviation (divides by `n`, not `n - 1`).
    pub std_dev: f64,
    /// Coefficient of variation, `std_dev / avg × 100`.
    ///
    /// `None` when the mean is zero and the ratio is undefined.
    pub cv: Option<f64>,
}

impl DurationStats {
    /// Compute statistics for `durations`; `None` for an empty slice.
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }
        let n = durations.len() as f64;
        let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = durations.iter().sum::<f64>() / n;
        let variance = durations.iter().map(|d| (d - avg).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let cv = if avg == 0.0 {
            None
        } else {
            Some(std_dev / avg * 100.0)
        };

        Some(Self {
            min,
            max,
            avg,
            std_dev,
            cv,
        })
    }
}

/// Descending comparison for optional CVs: undefined sorts last.
pub fn cmp_cv_desc(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overdue_threshold_is_exclusive() {
        assert!(!is_overdue(60.0));
        assert!(is_overdue(60.01));
    }

    #[test]
    fn test_stats_basic() {
        let stats = DurationStats::from_durations(&[70.0, 30.0]).unwrap();
        assert_eq!(stats.min, 30.0);
        assert_eq!(stats.max, 70.0);
        assert_eq!(stats.avg, 50.0);
        assert!((stats.std_dev - 20.0).abs() < 1e-9);
        assert!((stats.cv.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_single_value_has_zero_spread() {
        let stats = DurationStats::from_durations(&[90.0]).unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.cv, Some(0.0));
    }

    #[test]
    fn test_stats_zero_mean_cv_undefined() {
        let stats = DurationStats::from_durations(&[0.0, 0.0]).unwrap();
        assert_eq!(stats.cv, None);
    }

    #[test]
    fn test_stats_empty() {
        assert!(DurationStats::from_durations(&[]).is_none());
    }

    #[test]
    fn test_cmp_cv_desc_orders_none_last() {
        let mut values = vec![None, Some(10.0), Some(40.0)];
        values.sort_by(|a, b| cmp_cv_desc(*a, *b));
        assert_eq!(values, vec![Some(40.0), Some(10.0), None]);
    }
}
