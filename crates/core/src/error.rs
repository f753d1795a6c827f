use thiserror::Error;

/// Pipeline failure taxonomy. Every variant is isolated at its own boundary;
/// only `FatalLoop` stops the ingestion loop.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source fetch failed for category '{category}': {message}")]
    Source { category: String, message: String },

    #[error("persistence sink failed: {0}")]
    Persistence(String),

    #[error("broadcast delivery failed: {0}")]
    Broadcast(String),

    #[error("source connector unavailable: {0}")]
    ConnectorUnavailable(String),

    #[error("fatal ingestion loop failure: {0}")]
    FatalLoop(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PipelineError {
    /// Convenience constructor for category-scoped fetch failures.
    pub fn source(category: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Source {
            category: category.into(),
            message: message.to_string(),
        }
    }
}
