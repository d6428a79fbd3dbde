//! Retrieval-augmented chat backend.
//!
//! Documents are embedded into a persistent SQLite vector store; chat queries
//! retrieve the closest documents and send them, with the query, to an
//! OpenAI-compatible completion endpoint.

pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod vector_math;
