//! Error taxonomy shared by every stage of the posting pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type BotResult<T> = Result<T, BotError>;

/// Errors raised while building or publishing a post.
///
/// `Load` and `Config` cannot be fixed by trying again and abort a run.
/// The remaining kinds are transient as far as the run controller cares.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    /// Dataset missing or malformed
    #[error("Failed to load dataset: {0}")]
    Load(String),

    /// Settings leave nothing to work with
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Observation metadata could not be turned into a caption
    #[error("Failed to format caption: {0}")]
    Format(String),

    /// Catalog request, JSON decode or image download failed
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication, media upload or post creation failed
    #[error("Failed to publish: {0}")]
    Publish(String),
}

impl BotError {
    /// Whether the run controller should start a fresh attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BotError::Format(_) | BotError::Network(_) | BotError::Publish(_)
        )
    }

    /// Short name of the error kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::Load(_) => "load",
            BotError::Config(_) => "config",
            BotError::Format(_) => "format",
            BotError::Network(_) => "network",
            BotError::Publish(_) => "publish",
        }
    }
}
