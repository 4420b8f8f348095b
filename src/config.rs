//! YAML configuration file support for the finsight pipeline.
//!
//! Lets deployments define every stage configuration (pipeline glue,
//! embedding, outlier detection, advisor, speech) in a single YAML file and
//! load it at runtime. Secrets stay out of the file: API keys are picked up
//! from environment variables via [`FinsightConfig::with_env_overrides`].
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # finsight pipeline configuration
//! version: "1.0"
//!
//! pipeline:
//!   delimiter: ","
//!
//! embedding:
//!   mode: "api"
//!   api_url: "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:batchEmbedContents"
//!   api_provider: "gemini"
//!   model_name: "embedding-001"
//!   normalize: true
//!
//! outlier:
//!   contamination: 0.01
//!   adaptive_contamination: true
//!   tree_count: 100
//!
//! advisor:
//!   mode: "api"
//!   api_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
//!   api_provider: "gemini"
//!
//! speech:
//!   mode: "stub"
//!   output_path: "daily_report.mp3"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use advisor::AdvisorConfig;
use embedding::EmbeddingConfig;
use outlier::OutlierConfig;
use speech::SpeechConfig;

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the whole report pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinsightConfig {
    /// Configuration format version.
    pub version: String,

    /// Optional configuration name/description.
    #[serde(default)]
    pub name: Option<String>,

    /// Orchestration glue settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Embedder settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Outlier detector settings.
    #[serde(default)]
    pub outlier: OutlierConfig,

    /// Advice generation settings.
    #[serde(default)]
    pub advisor: AdvisorConfig,

    /// Spoken report settings.
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Settings for the glue between the stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Separator used to split the raw transaction text into descriptions.
    /// Descriptions containing the delimiter will be mis-split; switch to
    /// `"\n"` for one-per-line input instead of guessing intent.
    pub delimiter: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
        }
    }
}

impl FinsightConfig {
    /// Load a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: FinsightConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill API keys from the environment when the file left them unset:
    /// `FINSIGHT_EMBEDDING_API_KEY`, `FINSIGHT_ADVISOR_API_KEY`,
    /// `FINSIGHT_SPEECH_API_KEY`.
    pub fn with_env_overrides(mut self) -> Self {
        if self.embedding.api_key.is_none() {
            if let Ok(key) = std::env::var("FINSIGHT_EMBEDDING_API_KEY") {
                self.embedding.api_key = Some(key);
            }
        }
        if self.advisor.api_key.is_none() {
            if let Ok(key) = std::env::var("FINSIGHT_ADVISOR_API_KEY") {
                self.advisor.api_key = Some(key);
            }
        }
        if self.speech.api_key.is_none() {
            if let Ok(key) = std::env::var("FINSIGHT_SPEECH_API_KEY") {
                self.speech.api_key = Some(key);
            }
        }
        self
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        let valid_embedding_modes = ["stub", "api", "onnx"];
        if !valid_embedding_modes.contains(&self.embedding.mode.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "embedding.mode must be one of: {valid_embedding_modes:?}"
            )));
        }
        if self.embedding.mode == "api" && self.embedding.api_url.is_none() {
            return Err(ConfigLoadError::Validation(
                "embedding.api_url is required when embedding.mode is 'api'".to_string(),
            ));
        }

        if !self.outlier.contamination.is_finite()
            || self.outlier.contamination <= 0.0
            || self.outlier.contamination > 0.5
        {
            return Err(ConfigLoadError::Validation(
                "outlier.contamination must be in (0, 0.5]".to_string(),
            ));
        }
        if self.outlier.tree_count == 0 {
            return Err(ConfigLoadError::Validation(
                "outlier.tree_count must be >= 1".to_string(),
            ));
        }

        let valid_collaborator_modes = ["stub", "api"];
        if !valid_collaborator_modes.contains(&self.advisor.mode.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "advisor.mode must be one of: {valid_collaborator_modes:?}"
            )));
        }
        if self.advisor.mode == "api" && self.advisor.api_url.is_none() {
            return Err(ConfigLoadError::Validation(
                "advisor.api_url is required when advisor.mode is 'api'".to_string(),
            ));
        }
        if !valid_collaborator_modes.contains(&self.speech.mode.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "speech.mode must be one of: {valid_collaborator_modes:?}"
            )));
        }
        if self.speech.mode == "api" && self.speech.api_url.is_none() {
            return Err(ConfigLoadError::Validation(
                "speech.api_url is required when speech.mode is 'api'".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for FinsightConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            pipeline: PipelineConfig::default(),
            embedding: EmbeddingConfig::default(),
            outlier: OutlierConfig::default(),
            advisor: AdvisorConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
pipeline:
  delimiter: "\n"
embedding:
  mode: "stub"
  stub_dim: 64
outlier:
  contamination: 0.1
  seed: 42
"#;

        let config = FinsightConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name, Some("test config".to_string()));
        assert_eq!(config.pipeline.delimiter, "\n");
        assert_eq!(config.embedding.stub_dim, 64);
        assert_eq!(config.outlier.contamination, 0.1);
        assert_eq!(config.outlier.seed, Some(42));
    }

    #[test]
    fn load_from_file() {
        let yaml = r#"
version: "1.0"
embedding:
  mode: "stub"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = FinsightConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = FinsightConfig::from_yaml("version: \"1.0\"").unwrap();
        assert_eq!(config.pipeline.delimiter, ",");
        assert_eq!(config.embedding.mode, "stub");
        assert_eq!(config.outlier.contamination, 0.01);
        assert_eq!(config.advisor.mode, "stub");
        assert_eq!(config.speech.mode, "stub");
    }

    #[test]
    fn unsupported_version_rejected() {
        let result = FinsightConfig::from_yaml("version: \"7\"");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn api_mode_without_url_rejected() {
        let yaml = r#"
version: "1.0"
embedding:
  mode: "api"
"#;
        let result = FinsightConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("embedding.api_url"));
    }

    #[test]
    fn bad_contamination_rejected() {
        let yaml = r#"
version: "1.0"
outlier:
  contamination: 0.9
"#;
        let result = FinsightConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("contamination"));
    }

    #[test]
    fn unknown_collaborator_mode_rejected() {
        let yaml = r#"
version: "1.0"
advisor:
  mode: "crystal-ball"
"#;
        assert!(FinsightConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn env_overrides_fill_missing_keys_only() {
        std::env::set_var("FINSIGHT_ADVISOR_API_KEY", "env-key");
        let mut config = FinsightConfig::default();
        config.embedding.api_key = Some("file-key".to_string());

        let config = config.with_env_overrides();
        assert_eq!(config.advisor.api_key, Some("env-key".to_string()));
        assert_eq!(config.embedding.api_key, Some("file-key".to_string()));
        std::env::remove_var("FINSIGHT_ADVISOR_API_KEY");
    }

    #[test]
    fn full_yaml_roundtrip() {
        let yaml = r#"
version: "1.0"
name: "production"
pipeline:
  delimiter: ","
embedding:
  mode: "api"
  api_url: "https://api.example.com/embed"
  api_provider: "gemini"
  model_name: "embedding-001"
  normalize: true
outlier:
  contamination: 0.01
  adaptive_contamination: true
  tree_count: 100
  max_samples: 256
advisor:
  mode: "api"
  api_url: "https://api.example.com/generate"
  api_provider: "gemini"
speech:
  mode: "stub"
  output_path: "daily_report.mp3"
"#;

        let config = FinsightConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.embedding.api_provider, Some("gemini".to_string()));
        assert_eq!(config.outlier.tree_count, 100);
        assert_eq!(config.advisor.mode, "api");
        assert_eq!(
            config.speech.output_path,
            std::path::PathBuf::from("daily_report.mp3")
        );
    }
}
