//! Workspace umbrella crate for finsight.
//!
//! Stitches the four stage crates together into the per-request report flow:
//! split the raw transaction text, embed the descriptions, fit an outlier
//! ensemble over the vectors, map flagged indices back to descriptions, and
//! wrap everything (plus the advice and audio collaborators) into one bundle.
//!
//! Every stage degrades independently: a dead embedding endpoint costs the
//! fraud section, a dead advice endpoint costs the advice section, and neither
//! ever aborts the request.

pub mod config;

pub use advisor::{generate_advice, AdvisorConfig, AdvisorError};
pub use embedding::{embed_batch, EmbeddingBatch, EmbeddingConfig, EmbeddingError};
pub use outlier::{detect, score, OutlierConfig, OutlierError, OutlierReport};
pub use speech::{synthesize_report, SpeechConfig, SpeechError};

pub use crate::config::{ConfigLoadError, FinsightConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One transaction the detector judged anomalous, mapped back to its
/// position and original text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FraudFinding {
    /// 0-based position in the split transaction list.
    pub index: usize,
    /// The description exactly as the user entered it (post-trim).
    pub description: String,
}

/// Outcome of the fraud-detection section for one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FraudSummary {
    /// At least one transaction crossed the detector's threshold.
    Flagged(Vec<FraudFinding>),
    /// Detection ran and nothing stood out.
    Clean,
    /// Embedding or detection failed; the rest of the report still stands.
    Unavailable { reason: String },
}

/// Everything one request produces. Optional sections are `None` when their
/// collaborator failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    /// Narrative advice text, when the advisor collaborator succeeded.
    pub advice: Option<String>,
    pub fraud: FraudSummary,
    /// Path of the rendered audio file, when synthesis succeeded.
    pub audio: Option<PathBuf>,
    /// The plain-text narration the audio was (or would have been) rendered from.
    pub narration: String,
}

/// Split raw transaction text into trimmed, non-empty descriptions.
///
/// Descriptions containing the delimiter are split at it; that is a known
/// limitation of delimiter-separated input, not something we try to guess
/// around. Callers wanting exact grouping can switch the delimiter (e.g. to
/// `"\n"`) through the pipeline config.
pub fn split_transactions(raw: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        let trimmed = raw.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }
    raw.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run embedding + outlier detection over the description list.
///
/// Never fails: backend errors come back as [`FraudSummary::Unavailable`]
/// and the enclosing report always completes.
pub async fn detect_fraud(
    descriptions: &[String],
    embedding_cfg: &EmbeddingConfig,
    outlier_cfg: &OutlierConfig,
) -> FraudSummary {
    let batch = match embed_batch(descriptions, embedding_cfg).await {
        Ok(batch) => batch,
        Err(err) => {
            tracing::warn!(error = %err, "embedding failed, skipping fraud detection");
            return FraudSummary::Unavailable {
                reason: err.to_string(),
            };
        }
    };
    tracing::info!(
        rows = batch.len(),
        dim = batch.embedding_dim,
        model = %batch.model_name,
        "transaction embeddings ready"
    );

    let anomalies = match detect(&batch.vectors, outlier_cfg) {
        Ok(anomalies) => anomalies,
        Err(err) => {
            tracing::warn!(error = %err, "outlier detection failed");
            return FraudSummary::Unavailable {
                reason: err.to_string(),
            };
        }
    };

    if anomalies.is_empty() {
        return FraudSummary::Clean;
    }

    let findings = anomalies
        .into_iter()
        .map(|index| FraudFinding {
            index,
            description: descriptions[index].clone(),
        })
        .collect();
    FraudSummary::Flagged(findings)
}

/// Assemble the plain-text narration handed to the speech collaborator.
pub fn report_narration(advice: Option<&str>, fraud: &FraudSummary) -> String {
    let mut narration = String::from("Daily Financial Health Report.\n\n");
    if let Some(advice) = advice {
        narration.push_str(advice);
        narration.push_str("\n\n");
    }
    narration.push_str("Fraud Detection Summary: ");
    narration.push_str(match fraud {
        FraudSummary::Flagged(_) => {
            "Suspicious activity was detected. Please review your flagged transactions."
        }
        FraudSummary::Clean => "No suspicious activity was detected today.",
        FraudSummary::Unavailable { .. } => "Fraud detection was unavailable for this report.",
    });
    narration
}

/// Produce the full report bundle for one request: advice, fraud flags, and
/// the spoken summary.
pub async fn generate_report(
    financial_goals: &str,
    transactions_text: &str,
    cfg: &FinsightConfig,
) -> ReportBundle {
    let advice = match generate_advice(financial_goals, transactions_text, &cfg.advisor).await {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(error = %err, "advice generation failed");
            None
        }
    };

    let descriptions = split_transactions(transactions_text, &cfg.pipeline.delimiter);
    tracing::info!(count = descriptions.len(), "transactions parsed");
    let fraud = detect_fraud(&descriptions, &cfg.embedding, &cfg.outlier).await;

    let narration = report_narration(advice.as_deref(), &fraud);
    let audio = match synthesize_report(&narration, &cfg.speech).await {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::warn!(error = %err, "audio synthesis failed");
            None
        }
    };

    ReportBundle {
        advice,
        fraud,
        audio,
        narration,
    }
}
