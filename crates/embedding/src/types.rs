use serde::{Deserialize, Serialize};

/// One embedding vector per transaction description, index-aligned with the
/// input batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingBatch {
    /// Row `i` is the vector for input description `i`.
    pub vectors: Vec<Vec<f32>>,
    /// Name of the model that produced the vectors.
    pub model_name: String,
    /// Dimension shared by every row (0 for an empty batch).
    pub embedding_dim: usize,
    /// Whether each row was L2-normalized.
    pub normalized: bool,
}

impl EmbeddingBatch {
    /// Number of rows (== number of input descriptions).
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
