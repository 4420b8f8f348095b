use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{EmbeddingConfig, EmbeddingError};

#[derive(Debug)]
pub(crate) struct ModelAssets {
    pub(crate) model_path: PathBuf,
    pub(crate) tokenizer_path: PathBuf,
}

/// Missing-asset failures degrade to the stub backend when the config allows
/// it; genuine inference failures never do.
pub(crate) fn should_fallback_to_stub(err: &EmbeddingError) -> bool {
    matches!(
        err,
        EmbeddingError::ModelNotFound(_)
            | EmbeddingError::TokenizerMissing(_)
            | EmbeddingError::Download(_)
    )
}

/// Ensures that the model and tokenizer exist locally, downloading them when URLs are provided.
pub(crate) async fn resolve_model_assets(
    cfg: &EmbeddingConfig,
) -> Result<ModelAssets, EmbeddingError> {
    let model_path = ensure_local_file(&cfg.model_path, cfg.model_url.as_deref(), || {
        EmbeddingError::ModelNotFound(cfg.model_path.display().to_string())
    })
    .await?;

    let tokenizer_target = tokenizer_storage_path(cfg)?;
    let tokenizer_path = ensure_local_file(&tokenizer_target, cfg.tokenizer_url.as_deref(), || {
        EmbeddingError::TokenizerMissing(cfg.model_name.clone())
    })
    .await?;

    Ok(ModelAssets {
        model_path,
        tokenizer_path,
    })
}

/// Determines where the tokenizer should be stored. When no explicit path is supplied we infer a
/// filename from the remote URL and place it next to the model file.
fn tokenizer_storage_path(cfg: &EmbeddingConfig) -> Result<PathBuf, EmbeddingError> {
    if let Some(path) = &cfg.tokenizer_path {
        return Ok(path.clone());
    }

    if let Some(url) = &cfg.tokenizer_url {
        let inferred_name = infer_filename_from_url(url).unwrap_or_else(|| "tokenizer.json".into());
        let base_dir = cfg
            .model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok(base_dir.join(inferred_name));
    }

    Err(EmbeddingError::TokenizerMissing(cfg.model_name.clone()))
}

/// Returns `target` if it already exists, otherwise attempts to download `remote_url`.
async fn ensure_local_file<F>(
    target: &Path,
    remote_url: Option<&str>,
    on_missing: F,
) -> Result<PathBuf, EmbeddingError>
where
    F: FnOnce() -> EmbeddingError,
{
    if target.exists() {
        return Ok(target.to_path_buf());
    }

    if let Some(url) = remote_url {
        download_to_path(target, url).await?;
        return Ok(target.to_path_buf());
    }

    Err(on_missing())
}

/// Downloads `url` into `target`, creating parent directories as needed.
async fn download_to_path(target: &Path, url: &str) -> Result<(), EmbeddingError> {
    if let Some(parent) = target.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    tracing::info!(url, dest = %target.display(), "downloading model asset");
    let response = reqwest::get(url)
        .await
        .map_err(|e| EmbeddingError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EmbeddingError::Download(format!(
            "unexpected status {status} while fetching {url}"
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| EmbeddingError::Download(e.to_string()))?;

    fs::write(target, &bytes)?;
    Ok(())
}

/// Extracts a filename from the provided URL, stripping query/fragment parts.
fn infer_filename_from_url(url: &str) -> Option<String> {
    url.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.split(['?', '#']).next().unwrap_or(segment))
        .map(|segment| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_only_for_missing_assets() {
        assert!(should_fallback_to_stub(&EmbeddingError::ModelNotFound(
            "m".into()
        )));
        assert!(should_fallback_to_stub(&EmbeddingError::TokenizerMissing(
            "t".into()
        )));
        assert!(should_fallback_to_stub(&EmbeddingError::Download(
            "dns".into()
        )));
        assert!(!should_fallback_to_stub(&EmbeddingError::Inference(
            "bad output".into()
        )));
        assert!(!should_fallback_to_stub(&EmbeddingError::InvalidConfig(
            "no url".into()
        )));
    }

    #[test]
    fn tokenizer_path_prefers_explicit_setting() {
        let cfg = EmbeddingConfig {
            tokenizer_path: Some(PathBuf::from("/explicit/tokenizer.json")),
            tokenizer_url: Some("https://example.com/other.json".into()),
            ..Default::default()
        };
        let path = tokenizer_storage_path(&cfg).unwrap();
        assert_eq!(path, PathBuf::from("/explicit/tokenizer.json"));
    }

    #[test]
    fn tokenizer_path_inferred_from_url() {
        let cfg = EmbeddingConfig {
            model_path: PathBuf::from("/models/encoder/model.onnx"),
            tokenizer_path: None,
            tokenizer_url: Some("https://example.com/assets/tokenizer.json?rev=2".into()),
            ..Default::default()
        };
        let path = tokenizer_storage_path(&cfg).unwrap();
        assert_eq!(path, PathBuf::from("/models/encoder/tokenizer.json"));
    }

    #[test]
    fn tokenizer_missing_without_path_or_url() {
        let cfg = EmbeddingConfig {
            tokenizer_path: None,
            tokenizer_url: None,
            ..Default::default()
        };
        assert!(matches!(
            tokenizer_storage_path(&cfg),
            Err(EmbeddingError::TokenizerMissing(_))
        ));
    }

    #[test]
    fn filename_inference_strips_query_and_fragment() {
        assert_eq!(
            infer_filename_from_url("https://host/a/b/tokenizer.json?x=1#frag"),
            Some("tokenizer.json".to_string())
        );
        assert_eq!(
            infer_filename_from_url("https://host/a/b/"),
            Some("b".to_string())
        );
    }
}
