//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `Embedder`: text to fixed-length vectors (`HashingEmbedder`, `OpenAiEmbedder`)
//! - `VectorStore`: persistent document storage with similarity search (`SqliteVectorStore`)
//! - `Retriever` and `ContextAssembler`: query-time retrieval and prompt building
//! - `RagService`: the ingestion and chat entry points

pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod retriever;
pub mod service;
pub mod sqlite;
pub mod store;

pub use context::{ContextAssembler, Prompt};
pub use document::{Document, DocumentSummary, Metadata, NewDocument, RetrievalResult, RetrievedDocument};
pub use embedding::{build_embedder, Embedder, HashingEmbedder, OpenAiEmbedder};
pub use error::RagError;
pub use retriever::{clamp_results, Retriever, DEFAULT_RESULTS, MAX_RESULTS};
pub use service::{ChatExchange, RagService};
pub use sqlite::SqliteVectorStore;
pub use store::VectorStore;
