use thiserror::Error;

/// Errors surfaced while fitting or scoring the outlier ensemble.
///
/// All variants are recoverable: the pipeline reports "fraud detection
/// unavailable" and finishes the rest of the request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OutlierError {
    /// Rows of the input matrix disagree on dimensionality.
    #[error("ragged embedding matrix: row {row} has {found} columns, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A NaN or infinite value reached the detector.
    #[error("non-finite value at row {row}, column {col}")]
    NonFinite { row: usize, col: usize },
    /// Configuration out of range (e.g., contamination above 0.5).
    #[error("invalid outlier config: {0}")]
    InvalidConfig(String),
}
