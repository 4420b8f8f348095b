use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retry::RetryConfig;

/// Runtime configuration describing which embedding backend to use and how to
/// post-process the vectors.
///
/// # Example
/// ```no_run
/// use embedding::EmbeddingConfig;
///
/// let cfg = EmbeddingConfig {
///     mode: "api".into(),
///     api_url: Some("https://generativelanguage.googleapis.com/v1beta/models/embedding-001:batchEmbedContents".into()),
///     api_key: Some("AIza-xxx".into()),
///     api_provider: Some("gemini".into()),
///     ..Default::default()
/// };
/// # let _ = cfg;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend selector: `"api"` (remote HTTP), `"onnx"` (local model), or `"stub"`
    /// (deterministic offline vectors).
    pub mode: String,
    /// Friendly model label surfaced on every [`EmbeddingBatch`](crate::EmbeddingBatch).
    pub model_name: String,
    /// Local path where the ONNX file should live (also used as the download target
    /// when [`model_url`](Self::model_url) is provided).
    pub model_path: PathBuf,
    /// Optional HTTPS URL that will be downloaded when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Embedding endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// API credential. Sent as `x-goog-api-key` for the `gemini` provider and as a
    /// bearer `Authorization` header for everything else.
    pub api_key: Option<String>,
    /// Remote provider hint: `"gemini"`, `"openai"`, `"hf"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Path to `tokenizer.json`. When absent and [`tokenizer_url`](Self::tokenizer_url)
    /// is provided we infer the filename from the URL and place it next to the model file.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional HTTPS URL for fetching the tokenizer on-demand.
    pub tokenizer_url: Option<String>,
    /// Token limit per description; longer inputs are truncated.
    pub max_sequence_length: usize,
    /// Normalize each vector to unit length (recommended for cosine similarity).
    pub normalize: bool,
    /// Dimensionality of stub vectors.
    pub stub_dim: usize,
    /// When ONNX assets are missing, fall back to the stub backend instead of
    /// failing the request. Inference errors on loaded models still surface.
    pub fallback_to_stub: bool,
    /// Bounded retry for remote calls. `None` disables retries (single attempt).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: "stub".into(),
            model_name: "bge-small-en-v1.5".into(),
            model_path: PathBuf::from("./models/bge-small-en-v1.5/onnx/model.onnx"),
            model_url: None,
            api_url: None,
            api_key: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            tokenizer_path: Some(PathBuf::from("./models/bge-small-en-v1.5/tokenizer.json")),
            tokenizer_url: None,
            max_sequence_length: 256,
            normalize: true,
            stub_dim: 384,
            fallback_to_stub: true,
            retry: Some(RetryConfig::default()),
        }
    }
}
