use thiserror::Error;

use crate::rag::RagError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to initialize embedder: {0}")]
    Embedder(#[source] RagError),

    #[error("Failed to open vector store: {0}")]
    Store(#[source] RagError),
}
