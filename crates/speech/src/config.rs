use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the spoken-report collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    /// Backend selector: `"api"` (remote TTS endpoint) or `"stub"` (writes a
    /// placeholder file, for tests and offline runs).
    pub mode: String,
    /// TTS endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// API credential, sent as a bearer `Authorization` header.
    pub api_key: Option<String>,
    /// Voice identifier passed to the endpoint.
    pub voice: String,
    /// Model identifier for providers that want one in the payload.
    pub model_name: String,
    /// Where the rendered MP3 lands.
    pub output_path: PathBuf,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            mode: "stub".into(),
            api_url: None,
            api_key: None,
            voice: "alloy".into(),
            model_name: "tts-1".into(),
            output_path: PathBuf::from("daily_report.mp3"),
            api_timeout_secs: Some(60),
        }
    }
}
