//! Spoken report rendering.
//!
//! Takes the assembled report text and produces an MP3 on disk through a
//! remote text-to-speech endpoint (OpenAI-compatible `audio/speech` payload
//! shape). A stub mode writes a placeholder file so the end-to-end flow stays
//! testable offline. Failures are error values; the caller ships the written
//! report without an audio section.

pub mod config;
pub mod error;

pub use crate::config::SpeechConfig;
pub use crate::error::SpeechError;

use once_cell::sync::Lazy;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client")
});

// Stand-in bytes written by stub mode; not a playable MP3.
const STUB_AUDIO: &[u8] = b"finsight-stub-audio";

/// Render `report_text` to the configured output path and return that path.
pub async fn synthesize_report(
    report_text: &str,
    cfg: &SpeechConfig,
) -> Result<PathBuf, SpeechError> {
    let bytes = match cfg.mode.as_str() {
        "stub" => STUB_AUDIO.to_vec(),
        "api" => fetch_audio(report_text, cfg).await?,
        other => {
            return Err(SpeechError::InvalidConfig(format!(
                "unknown speech mode '{other}'"
            )))
        }
    };

    if let Some(parent) = cfg.output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&cfg.output_path, &bytes)?;
    tracing::info!(path = %cfg.output_path.display(), bytes = bytes.len(), "audio report written");

    Ok(cfg.output_path.clone())
}

async fn fetch_audio(report_text: &str, cfg: &SpeechConfig) -> Result<Vec<u8>, SpeechError> {
    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| SpeechError::InvalidConfig("api_url is required for api mode".into()))?;

    let payload = json!({
        "model": cfg.model_name,
        "voice": cfg.voice,
        "input": report_text,
        "response_format": "mp3",
    });

    let mut request = HTTP_CLIENT
        .post(url)
        .timeout(Duration::from_secs(cfg.api_timeout_secs.unwrap_or(60)))
        .header("Content-Type", "application/json");
    if let Some(key) = cfg.api_key.as_deref() {
        request = request.header("Authorization", format!("Bearer {key}"));
    }

    let response = request
        .json(&payload)
        .send()
        .await
        .map_err(|e| SpeechError::Request(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SpeechError::Request(format!("HTTP error {status}: {body}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SpeechError::Request(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_mode_writes_placeholder_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SpeechConfig {
            output_path: dir.path().join("report.mp3"),
            ..Default::default()
        };

        let path = synthesize_report("Hello, here is your report.", &cfg)
            .await
            .unwrap();
        assert_eq!(path, cfg.output_path);
        assert_eq!(fs::read(&path).unwrap(), STUB_AUDIO);
    }

    #[tokio::test]
    async fn stub_mode_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SpeechConfig {
            output_path: dir.path().join("nested").join("deep").join("report.mp3"),
            ..Default::default()
        };

        let path = synthesize_report("text", &cfg).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn api_mode_without_url_is_invalid_config() {
        let cfg = SpeechConfig {
            mode: "api".into(),
            ..Default::default()
        };
        let err = synthesize_report("text", &cfg).await.unwrap_err();
        assert!(matches!(err, SpeechError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn unknown_mode_is_invalid_config() {
        let cfg = SpeechConfig {
            mode: "gramophone".into(),
            ..Default::default()
        };
        let err = synthesize_report("text", &cfg).await.unwrap_err();
        assert!(matches!(err, SpeechError::InvalidConfig(_)));
    }
}
