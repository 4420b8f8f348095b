use serde::{Deserialize, Serialize};

/// Full detector output for one request: per-row anomaly scores plus the
/// indices that crossed the decision threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlierReport {
    /// Anomaly score in `(0, 1)` per input row, index-aligned with the matrix.
    pub scores: Vec<f64>,
    /// Decision threshold actually applied; `None` when no row was flagged
    /// (too few rows, or no score separation).
    pub threshold: Option<f64>,
    /// Flagged row indices, ascending, duplicate-free.
    pub anomalies: Vec<usize>,
}

impl OutlierReport {
    pub(crate) fn empty(n: usize) -> Self {
        Self {
            scores: vec![0.0; n],
            threshold: None,
            anomalies: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_flags() {
        let report = OutlierReport::empty(3);
        assert_eq!(report.scores.len(), 3);
        assert!(report.threshold.is_none());
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn report_serde_roundtrip() {
        let report = OutlierReport {
            scores: vec![0.4, 0.8, 0.3],
            threshold: Some(0.8),
            anomalies: vec![1],
        };
        let serialized = serde_json::to_string(&report).unwrap();
        let deserialized: OutlierReport = serde_json::from_str(&serialized).unwrap();
        assert_eq!(report, deserialized);
    }
}
