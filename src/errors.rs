use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Failed to search issues: {0}")]
    SearchError(String),

    #[error("Failed to fetch issue timeline: {0}")]
    TimelineFetchError(String),

    #[error("Failed to summarize timeline: {0}")]
    SummarizationError(String),

    #[error("Discussion category ({0}) not found")]
    CategoryNotFoundError(String),

    #[error("Failed to look up discussions: {0}")]
    DiscussionLookupError(String),

    #[error("Failed to create discussion: {0}")]
    DiscussionCreateError(String),

    #[error("Failed to comment on discussion: {0}")]
    CommentError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),
}

impl DigestError {
    /// Whether this failure must abort the run.
    ///
    /// Timeline and summarization failures only cost one issue its summary.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DigestError::TimelineFetchError(_) | DigestError::SummarizationError(_)
        )
    }
}

impl From<reqwest::Error> for DigestError {
    fn from(error: reqwest::Error) -> Self {
        DigestError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for DigestError {
    fn from(error: serde_json::Error) -> Self {
        DigestError::HttpError(format!("Invalid JSON payload: {error}"))
    }
}
