use thiserror::Error;

/// Failures of the retrieval pipeline.
///
/// Completion failures are deliberately absent: they are typed separately as
/// [`crate::llm::CompletionError`] and folded into the chat answer by
/// [`crate::rag::RagService::chat`].
#[derive(Debug, Error)]
pub enum RagError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("vector store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("document id already exists: {0}")]
    DuplicateId(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RagError {
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        RagError::StoreUnavailable(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        RagError::Embedding(err.to_string())
    }
}
