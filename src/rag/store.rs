//! VectorStore trait — abstract interface for document storage backends.

use async_trait::async_trait;

use super::document::{Document, DocumentSummary, RetrievedDocument};
use super::error::RagError;

/// Persistent collection of embedded documents.
///
/// Implementations encapsulate their own concurrency control: concurrent
/// inserts with distinct ids never corrupt each other, and a query never
/// observes a partially written record.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Stores a document. An existing id fails with [`RagError::DuplicateId`];
    /// records are never overwritten.
    async fn insert(&self, document: Document) -> Result<(), RagError>;

    /// Stores several documents atomically: either all are written or none.
    async fn insert_batch(&self, documents: Vec<Document>) -> Result<(), RagError>;

    /// Returns at most `k` documents by descending cosine similarity to
    /// `embedding`. Equal scores keep insertion order. An empty store yields
    /// an empty result.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>, RagError>;

    /// Every stored document's id and metadata, in insertion order.
    async fn list_all(&self) -> Result<Vec<DocumentSummary>, RagError>;

    async fn count(&self) -> Result<usize, RagError>;
}
