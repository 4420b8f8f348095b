use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Duration;

use crate::retry::{execute_with_retry, RetryConfig};
use crate::{EmbeddingConfig, EmbeddingError};

// Shared HTTP client with connection pooling; per-request timeouts come from
// the config.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

#[derive(Clone, Copy)]
enum ApiProviderKind {
    Gemini,
    OpenAi,
    HuggingFace,
    Custom,
}

fn api_provider_kind(cfg: &EmbeddingConfig) -> ApiProviderKind {
    let provider = cfg
        .api_provider
        .as_deref()
        .unwrap_or("custom")
        .to_ascii_lowercase();
    match provider.as_str() {
        "gemini" | "google" => ApiProviderKind::Gemini,
        "openai" | "gpt" => ApiProviderKind::OpenAi,
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        _ => ApiProviderKind::Custom,
    }
}

/// Embed a whole batch through the remote endpoint in one call.
pub(crate) async fn embed_batch_via_api<T>(
    texts: &[T],
    cfg: &EmbeddingConfig,
) -> Result<Vec<Vec<f32>>, EmbeddingError>
where
    T: AsRef<str>,
{
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| EmbeddingError::InvalidConfig("api_url is required for api mode".into()))?;

    let provider = api_provider_kind(cfg);
    let owned: Vec<String> = texts.iter().map(|t| t.as_ref().to_owned()).collect();
    let payload = build_api_payload(provider, &owned, cfg);

    let response = match cfg.retry {
        Some(retry_cfg) => send_with_retry(url, cfg, payload, &retry_cfg).await?,
        None => send_api_request(url, cfg, payload).await?,
    };

    let vectors = parse_embeddings_from_value(response)?;
    if vectors.len() != owned.len() {
        return Err(EmbeddingError::Inference(format!(
            "API returned {} embeddings for {} inputs",
            vectors.len(),
            owned.len()
        )));
    }
    Ok(vectors)
}

async fn send_with_retry(
    url: &str,
    cfg: &EmbeddingConfig,
    payload: Value,
    retry_cfg: &RetryConfig,
) -> Result<Value, EmbeddingError> {
    let result = execute_with_retry(retry_cfg, |attempt| {
        let payload = payload.clone();
        async move {
            if attempt > 0 {
                tracing::debug!(attempt, "retrying embedding request");
            }
            send_api_request(url, cfg, payload)
                .await
                .map_err(|e| e.to_string())
        }
    })
    .await;

    result.map_err(EmbeddingError::Download)
}

fn build_api_payload(provider: ApiProviderKind, texts: &[String], cfg: &EmbeddingConfig) -> Value {
    match provider {
        // batchEmbedContents shape; `models/<name>` is required in each entry.
        ApiProviderKind::Gemini => {
            let model = if cfg.model_name.starts_with("models/") {
                cfg.model_name.clone()
            } else {
                format!("models/{}", cfg.model_name)
            };
            let requests: Vec<Value> = texts
                .iter()
                .map(|text| {
                    json!({
                        "model": model,
                        "content": { "parts": [ { "text": text } ] },
                    })
                })
                .collect();
            json!({ "requests": requests })
        }
        ApiProviderKind::OpenAi => json!({ "input": texts, "model": cfg.model_name }),
        ApiProviderKind::HuggingFace => json!({ "inputs": texts }),
        ApiProviderKind::Custom => json!({ "texts": texts }),
    }
}

async fn send_api_request(
    url: &str,
    cfg: &EmbeddingConfig,
    payload: Value,
) -> Result<Value, EmbeddingError> {
    let mut request = HTTP_CLIENT
        .post(url)
        .timeout(Duration::from_secs(cfg.api_timeout_secs.unwrap_or(30)))
        .header("Content-Type", "application/json");

    if let Some(key) = cfg.api_key.as_deref() {
        request = match api_provider_kind(cfg) {
            ApiProviderKind::Gemini => request.header("x-goog-api-key", key),
            _ => request.header("Authorization", format!("Bearer {key}")),
        };
    }

    let response = request
        .json(&payload)
        .send()
        .await
        .map_err(|e| EmbeddingError::Download(format!("HTTP request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(EmbeddingError::Download(format!(
            "HTTP error {status}: {body}"
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| EmbeddingError::Inference(format!("invalid JSON response: {e}")))
}

/// Accepts the response shapes of the supported providers:
/// `{"embeddings": [{"values": [...]}, ...]}` (Gemini),
/// `{"data": [{"embedding": [...]}, ...]}` (OpenAI),
/// `[[...], ...]` (Hugging Face), and `{"embeddings": [[...], ...]}` (custom).
fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => {
                            if let Some(embedding) = obj.remove("embedding") {
                                vectors.push(parse_embedding_vector(embedding)?);
                            } else {
                                return Err(EmbeddingError::Inference(
                                    "missing `embedding` field in data item".into(),
                                ));
                            }
                        }
                        _ => {
                            return Err(EmbeddingError::Inference(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }

            Err(EmbeddingError::Inference(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else if items.iter().all(|item| matches!(item, Value::Object(_))) {
                // Gemini wraps each vector as {"values": [...]}.
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("values")
                            .ok_or_else(|| {
                                EmbeddingError::Inference(
                                    "missing `values` field in embeddings item".into(),
                                )
                            })
                            .and_then(parse_embedding_vector),
                        other => Err(EmbeddingError::Inference(format!(
                            "unexpected entry inside `embeddings` array: {other:?}"
                        ))),
                    })
                    .collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, EmbeddingError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| EmbeddingError::Inference("non-finite embedding value".into())),
                other => Err(EmbeddingError::Inference(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(EmbeddingError::Inference(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
