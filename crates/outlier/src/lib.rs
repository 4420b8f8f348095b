//! Per-request outlier detection over embedding matrices.
//!
//! Fits an unsupervised isolation-forest ensemble from scratch on every call
//! and returns the indices of rows it judges anomalous. Nothing is persisted
//! between calls; two requests never share detector state.
//!
//! The decision threshold comes from the configured contamination rate: the
//! top `ceil(rate * N)` scoring rows are flagged. With fewer than 2 rows there
//! is nothing to be an outlier *of*, so the result is empty rather than an
//! error.
//!
//! ## Quick example
//!
//! ```
//! use outlier::{detect, OutlierConfig};
//!
//! let matrix = vec![
//!     vec![0.0_f32, 0.1],
//!     vec![0.1, 0.0],
//!     vec![0.05, 0.05],
//!     vec![9.0, 9.0],
//! ];
//! let cfg = OutlierConfig::default().with_seed(42).with_contamination(0.25);
//! let anomalies = detect(&matrix, &cfg).unwrap();
//! assert_eq!(anomalies, vec![3]);
//! ```

pub mod config;
pub mod error;
pub mod types;

mod forest;

pub use crate::config::OutlierConfig;
pub use crate::error::OutlierError;
pub use crate::types::OutlierReport;

use crate::forest::IsolationForest;

// Score spreads below this are noise; a batch of identical rows has no
// outliers, not N of them.
const MIN_SCORE_SPREAD: f64 = 1e-9;

/// Fit the ensemble and return only the flagged indices (ascending).
pub fn detect(matrix: &[Vec<f32>], cfg: &OutlierConfig) -> Result<Vec<usize>, OutlierError> {
    score(matrix, cfg).map(|report| report.anomalies)
}

/// Fit the ensemble and return scores, threshold, and flagged indices.
pub fn score(matrix: &[Vec<f32>], cfg: &OutlierConfig) -> Result<OutlierReport, OutlierError> {
    cfg.validate()?;
    validate_matrix(matrix)?;

    let n = matrix.len();
    if n < 2 {
        // An outlier relative to nothing is undefined.
        return Ok(OutlierReport::empty(n));
    }

    let mut rng = match cfg.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let forest = IsolationForest::fit(matrix, cfg.tree_count, cfg.max_samples, &mut rng);
    let scores: Vec<f64> = matrix.iter().map(|row| forest.score(row)).collect();

    let spread = scores.iter().cloned().fold(f64::MIN, f64::max)
        - scores.iter().cloned().fold(f64::MAX, f64::min);
    if spread < MIN_SCORE_SPREAD {
        tracing::debug!(rows = n, "no score separation, flagging nothing");
        return Ok(OutlierReport {
            scores,
            threshold: None,
            anomalies: Vec::new(),
        });
    }

    let effective = cfg.effective_contamination(n);
    // Never flag the whole batch: cap at n-1 picks.
    let flag_count = ((effective * n as f64).ceil() as usize).clamp(1, n - 1);

    // Rank by score descending, ties broken by lower index.
    let mut ranked: Vec<usize> = (0..n).collect();
    ranked.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let threshold = scores[ranked[flag_count - 1]];
    let mut anomalies: Vec<usize> = ranked[..flag_count].to_vec();
    anomalies.sort_unstable();

    tracing::debug!(
        rows = n,
        flagged = anomalies.len(),
        effective_contamination = effective,
        "outlier detection complete"
    );

    Ok(OutlierReport {
        scores,
        threshold: Some(threshold),
        anomalies,
    })
}

fn validate_matrix(matrix: &[Vec<f32>]) -> Result<(), OutlierError> {
    let Some(first) = matrix.first() else {
        return Ok(());
    };
    let expected = first.len();

    for (row, vector) in matrix.iter().enumerate() {
        if vector.len() != expected {
            return Err(OutlierError::DimensionMismatch {
                row,
                expected,
                found: vector.len(),
            });
        }
        for (col, value) in vector.iter().enumerate() {
            if !value.is_finite() {
                return Err(OutlierError::NonFinite { row, col });
            }
        }
    }
    Ok(())
}
