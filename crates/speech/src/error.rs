use std::io;
use thiserror::Error;

/// Errors surfaced while rendering the spoken report.
///
/// The audio section is the most optional part of the report; every variant
/// is recoverable and leaves the written report intact.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid speech config: {0}")]
    InvalidConfig(String),
    /// Could not reach the TTS endpoint or it answered with an error status.
    #[error("synthesis request failed: {0}")]
    Request(String),
    /// Writing the audio bytes to disk failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
