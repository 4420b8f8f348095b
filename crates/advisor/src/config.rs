use serde::{Deserialize, Serialize};

/// Configuration for the advice-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Backend selector: `"api"` (remote HTTP) or `"stub"` (canned offline text).
    pub mode: String,
    /// Text-generation endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// API credential. Sent as `x-goog-api-key` for the `gemini` provider and
    /// as a bearer `Authorization` header for everything else.
    pub api_key: Option<String>,
    /// Remote provider hint: `"gemini"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Model identifier passed to providers that want one in the payload.
    pub model_name: String,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            mode: "stub".into(),
            api_url: None,
            api_key: None,
            api_provider: None,
            model_name: "gemini-2.5-flash".into(),
            api_timeout_secs: Some(60),
        }
    }
}
