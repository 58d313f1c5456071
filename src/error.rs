//! Error taxonomy for the generation pipeline.

use thiserror::Error;

/// A required template parameter was missing.
///
/// Caller error: surfaced immediately, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder survived substitution because no value was supplied.
    #[error("missing template parameter `{0}`")]
    MissingParameter(String),
}

/// No valid file manifest could be parsed from a planning stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanParseError {
    /// The stream ended without ever yielding a parsable manifest.
    #[error("planning stream ended without a parsable file manifest")]
    StreamExhausted,
    /// The planning stream failed before a manifest could be parsed.
    #[error("planning stream failed: {0}")]
    StreamFailed(String),
}

/// Archive assembly failed. There is no partial-archive recovery.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Writing the compressed container failed.
    #[error("failed to write archive: {0}")]
    Io(#[from] std::io::Error),
    /// A synthetic entry (endpoint map, plan) could not be serialized.
    #[error("failed to serialize archive metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Top-level generation failure surfaced to callers.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Prompt rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// Plan extraction failed and no fallback manifest was configured.
    #[error(transparent)]
    Plan(#[from] PlanParseError),
    /// Archive assembly failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// A generation for this job key is already in progress.
    #[error("generation already in progress for job `{0}`")]
    JobInProgress(String),
    /// The model stream failed with no content to recover.
    #[error("model stream failed: {0}")]
    Stream(String),
    /// The generation task ended without reporting a result.
    #[error("generation task ended unexpectedly")]
    TaskEnded,
}

#[cfg(test)]
mod tests {
    use super::{GenerateError, PlanParseError, TemplateError};

    #[test]
    fn template_error_names_the_parameter() {
        let err = TemplateError::MissingParameter("source".into());
        assert_eq!(err.to_string(), "missing template parameter `source`");
    }

    #[test]
    fn plan_error_converts_into_generate_error() {
        let err: GenerateError = PlanParseError::StreamExhausted.into();
        assert!(matches!(err, GenerateError::Plan(_)));
    }
}
