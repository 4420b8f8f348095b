//! Transaction description embedding.
//!
//! Turns an ordered batch of free-text transaction descriptions into one dense
//! vector per description, so the downstream outlier detector can score them.
//! Three backends sit behind a single mode switch:
//!
//! - **API mode** - Call out to a remote embedding endpoint (Gemini, OpenAI,
//!   Hugging Face, or a custom shape).
//! - **ONNX mode** - Run a pre-trained sentence-embedding model locally.
//!   Requires model files; will download them when URLs are configured.
//! - **Stub mode** - Deterministic hash-derived vectors for tests and offline
//!   runs. No semantic signal, but reproducible.
//!
//! Backends are interchangeable by configuration: callers only see
//! `embed_batch(texts) -> Result<EmbeddingBatch, EmbeddingError>`, and every
//! backend failure comes back as an error value rather than a panic, so the
//! caller can degrade to "fraud detection unavailable" for the request.
//!
//! ONNX sessions and tokenizers are cached per thread after the first load;
//! the first call on any thread pays the setup cost.
//!
//! ## Quick example
//!
//! ```
//! use embedding::{embed_batch, EmbeddingConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = EmbeddingConfig::default(); // stub mode
//!     let batch = embed_batch(&["rent: 1500", "groceries: 400"], &cfg)
//!         .await
//!         .unwrap();
//!     assert_eq!(batch.len(), 2);
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

pub mod retry;

mod api;
mod assets;
mod cache;
mod normalize;
mod onnx;
mod stub;

pub use crate::config::EmbeddingConfig;
pub use crate::error::EmbeddingError;
pub use crate::retry::RetryConfig;
pub use crate::types::EmbeddingBatch;

use crate::api::embed_batch_via_api;
use crate::assets::{resolve_model_assets, should_fallback_to_stub};
use crate::cache::get_or_load_encoder;
use crate::normalize::l2_normalize_in_place;
use crate::onnx::run_onnx_embeddings;
use crate::stub::make_stub_vector;

/// Embed every description in `texts` through the configured backend,
/// preserving input order.
///
/// On success the returned batch always has exactly one row per input, all
/// rows sharing one dimensionality. Empty input yields an empty batch without
/// touching the backend. Empty strings are passed through to the backend and
/// whatever vector comes back is accepted.
pub async fn embed_batch<T>(
    texts: &[T],
    cfg: &EmbeddingConfig,
) -> Result<EmbeddingBatch, EmbeddingError>
where
    T: AsRef<str>,
{
    match cfg.mode.as_str() {
        "stub" => return Ok(stub_batch(texts, cfg)),
        "api" => {
            let vectors = embed_batch_via_api(texts, cfg).await?;
            return finish_batch(vectors, cfg);
        }
        "onnx" => {} // continue to the local model path
        other => {
            return Err(EmbeddingError::InvalidConfig(format!(
                "unknown embedding mode '{other}'"
            )))
        }
    }

    if texts.is_empty() {
        return Ok(stub_batch(texts, cfg));
    }

    // Resolve model assets, optionally falling back to the stub when they are
    // not present and cannot be fetched.
    let assets = match resolve_model_assets(cfg).await {
        Ok(assets) => assets,
        Err(err) if cfg.fallback_to_stub && should_fallback_to_stub(&err) => {
            tracing::warn!(error = %err, "model assets unavailable, using stub embeddings");
            return Ok(stub_batch(texts, cfg));
        }
        Err(err) => return Err(err),
    };

    let handle = get_or_load_encoder(&assets)?;
    let text_refs: Vec<&str> = texts.iter().map(|t| t.as_ref()).collect();
    let vectors = run_onnx_embeddings(handle.as_ref(), &text_refs, cfg.max_sequence_length)?;
    if vectors.len() != texts.len() {
        return Err(EmbeddingError::Inference(format!(
            "model returned {} embeddings for {} inputs",
            vectors.len(),
            texts.len()
        )));
    }

    finish_batch(vectors, cfg)
}

/// Single-description convenience wrapper around [`embed_batch`].
pub async fn embed(text: &str, cfg: &EmbeddingConfig) -> Result<Vec<f32>, EmbeddingError> {
    let mut batch = embed_batch(&[text], cfg).await?;
    batch
        .vectors
        .pop()
        .ok_or_else(|| EmbeddingError::Inference("backend returned no vectors".into()))
}

fn stub_batch<T: AsRef<str>>(texts: &[T], cfg: &EmbeddingConfig) -> EmbeddingBatch {
    let vectors: Vec<Vec<f32>> = texts
        .iter()
        .map(|t| make_stub_vector(t.as_ref(), cfg))
        .collect();
    let embedding_dim = vectors.first().map_or(0, Vec::len);
    EmbeddingBatch {
        vectors,
        model_name: cfg.model_name.clone(),
        embedding_dim,
        normalized: cfg.normalize,
    }
}

fn finish_batch(
    mut vectors: Vec<Vec<f32>>,
    cfg: &EmbeddingConfig,
) -> Result<EmbeddingBatch, EmbeddingError> {
    if cfg.normalize {
        for vector in &mut vectors {
            l2_normalize_in_place(vector);
        }
    }

    let embedding_dim = vectors.first().map_or(0, Vec::len);
    if vectors.iter().any(|v| v.len() != embedding_dim) {
        return Err(EmbeddingError::Inference(
            "backend returned vectors of mixed dimensionality".into(),
        ));
    }

    Ok(EmbeddingBatch {
        vectors,
        model_name: cfg.model_name.clone(),
        embedding_dim,
        normalized: cfg.normalize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn stub_mode_preserves_length_and_order() {
        let cfg = EmbeddingConfig::default();
        let texts = ["rent: 1500", "groceries: 400", "coffee: 100"];
        let batch = embed_batch(&texts, &cfg).await.unwrap();

        assert_eq!(batch.len(), texts.len());
        assert_eq!(batch.embedding_dim, cfg.stub_dim);
        // Order check: re-embedding a single text matches its batch row.
        let single = embed("groceries: 400", &cfg).await.unwrap();
        assert_eq!(batch.vectors[1], single);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_batch() {
        let cfg = EmbeddingConfig::default();
        let texts: Vec<&str> = vec![];
        let batch = embed_batch(&texts, &cfg).await.unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.embedding_dim, 0);
    }

    #[tokio::test]
    async fn duplicate_descriptions_embed_identically() {
        let cfg = EmbeddingConfig::default();
        let batch = embed_batch(
            &["groceries at local market", "groceries at local market"],
            &cfg,
        )
        .await
        .unwrap();
        assert_eq!(batch.vectors[0], batch.vectors[1]);
    }

    #[tokio::test]
    async fn empty_string_is_embedded_not_rejected() {
        let cfg = EmbeddingConfig::default();
        let batch = embed_batch(&["", "rent"], &cfg).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.vectors[0].len(), cfg.stub_dim);
    }

    #[tokio::test]
    async fn onnx_mode_falls_back_when_model_missing() {
        let cfg = EmbeddingConfig {
            mode: "onnx".into(),
            model_path: PathBuf::from("./missing/model.onnx"),
            tokenizer_path: Some(PathBuf::from("./missing/tokenizer.json")),
            ..Default::default()
        };

        let batch = embed_batch(&["hello", "world"], &cfg)
            .await
            .expect("missing assets should produce stub vectors");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.embedding_dim, cfg.stub_dim);
    }

    #[tokio::test]
    async fn onnx_mode_errors_when_fallback_disabled() {
        let cfg = EmbeddingConfig {
            mode: "onnx".into(),
            model_path: PathBuf::from("./missing/model.onnx"),
            tokenizer_path: Some(PathBuf::from("./missing/tokenizer.json")),
            fallback_to_stub: false,
            ..Default::default()
        };

        let err = embed_batch(&["hello"], &cfg).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn unknown_mode_is_invalid_config() {
        let cfg = EmbeddingConfig {
            mode: "quantum".into(),
            ..Default::default()
        };
        let err = embed_batch(&["x"], &cfg).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn normalization_produces_unit_vectors() {
        let cfg = EmbeddingConfig {
            normalize: true,
            ..Default::default()
        };
        let batch = embed_batch(&["dinner at a restaurant"], &cfg).await.unwrap();
        let norm: f32 = batch.vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(batch.normalized);
    }

    #[tokio::test]
    async fn unicode_descriptions_are_fine() {
        let cfg = EmbeddingConfig::default();
        let batch = embed_batch(&["café ☕ 北京"], &cfg).await.unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires local ONNX + tokenizer assets under models/"]
    async fn real_model_inference() {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let workspace_root = manifest_dir
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root");

        let cfg = EmbeddingConfig {
            mode: "onnx".into(),
            model_path: workspace_root
                .join("models")
                .join("bge-small-en-v1.5")
                .join("onnx")
                .join("model.onnx"),
            tokenizer_path: Some(
                workspace_root
                    .join("models")
                    .join("bge-small-en-v1.5")
                    .join("tokenizer.json"),
            ),
            fallback_to_stub: false,
            ..Default::default()
        };

        let batch = embed_batch(&["groceries at local market"], &cfg)
            .await
            .expect("inference should succeed with real model");
        assert_eq!(batch.len(), 1);
        assert!(batch.embedding_dim > 0);
    }
}
