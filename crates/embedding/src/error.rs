use std::io;
use thiserror::Error;

/// Errors surfaced while embedding transaction descriptions.
///
/// Every variant is a recoverable failure value: the pipeline treats any of
/// them as "no fraud detection this request" rather than aborting the report.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The ONNX model could not be located locally and no fallback URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    /// Unable to reach the remote endpoint or download model assets.
    #[error("download failed: {0}")]
    Download(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime, tokenizer, or response-decoding errors.
    #[error("inference failure: {0}")]
    Inference(String),
}
