use crate::models::SourceKind;

/// Failure taxonomy for the tracker.
///
/// Everything except `Configuration` is contained at its origin and turned
/// into an empty result; only a bad configuration stops the process.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Transport, HTTP status or schema failure. Triggers source fallback.
    #[error("{kind} upstream unavailable: {reason}")]
    UpstreamUnavailable { kind: SourceKind, reason: String },

    /// A single upstream record could not be decoded. The record is dropped.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Alert delivery failed. Logged, the cycle continues.
    #[error("Sink error: {0}")]
    Sink(String),

    /// Missing or invalid setting. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TrackerError {
    pub fn upstream(kind: SourceKind, reason: impl ToString) -> Self {
        TrackerError::UpstreamUnavailable {
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, TrackerError::UpstreamUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_names_source() {
        let err = TrackerError::upstream(SourceKind::Subgraph, "HTTP 502");
        assert!(err.is_upstream());
        assert_eq!(err.to_string(), "subgraph upstream unavailable: HTTP 502");
    }

    #[test]
    fn test_configuration_is_not_upstream() {
        let err = TrackerError::Configuration("MAX_ROWS must be > 0".into());
        assert!(!err.is_upstream());
    }
}
