use thiserror::Error;

/// Errors surfaced while generating advice text.
///
/// The orchestrator records a failed advice section and carries on; none of
/// these abort the surrounding report.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid advisor config: {0}")]
    InvalidConfig(String),
    /// Could not reach the text-generation endpoint.
    #[error("request failed: {0}")]
    Request(String),
    /// The endpoint answered with something we cannot interpret.
    #[error("unusable response: {0}")]
    Response(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = AdvisorError::Request("connection refused".into());
        assert!(err.to_string().contains("request failed"));
        assert!(err.to_string().contains("connection refused"));

        let err = AdvisorError::Response("no candidates".into());
        assert!(err.to_string().contains("unusable response"));
    }
}
