//! RagService — ingestion and the chat pipeline.
//!
//! A chat request moves strictly forward through
//! receive → retrieve → assemble → complete → respond. Validation, embedding
//! and store failures end the request with an error; a completion failure
//! does not, it becomes the answer text.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::context::ContextAssembler;
use super::document::{Document, DocumentSummary, Metadata, NewDocument};
use super::embedding::Embedder;
use super::error::RagError;
use super::retriever::Retriever;
use super::store::VectorStore;
use crate::llm::{CompletionClient, CompletionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatStage {
    ReceiveQuery,
    Retrieve,
    Assemble,
    Complete,
    Respond,
}

impl fmt::Display for ChatStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatStage::ReceiveQuery => "receive_query",
            ChatStage::Retrieve => "retrieve",
            ChatStage::Assemble => "assemble",
            ChatStage::Complete => "complete",
            ChatStage::Respond => "respond",
        };
        f.write_str(name)
    }
}

/// Result of one chat request. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatExchange {
    pub query_text: String,
    pub context: String,
    pub answer: String,
    pub context_used: bool,
}

/// Text returned as the answer when the completion backend fails.
pub fn completion_failure_answer(err: &CompletionError) -> String {
    format!("An error occurred: {}", err)
}

pub struct RagService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    retriever: Retriever,
    completion: Option<Arc<dyn CompletionClient>>,
}

impl RagService {
    /// `completion` is `None` when no credential is configured; ingestion
    /// and listing still work, chat fails with a configuration error.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        completion: Option<Arc<dyn CompletionClient>>,
    ) -> Self {
        let retriever = Retriever::new(embedder.clone(), store.clone());
        Self {
            embedder,
            store,
            retriever,
            completion,
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn completion_configured(&self) -> bool {
        self.completion.is_some()
    }

    /// Embeds and stores one document under a fresh id.
    pub async fn add_document(&self, text: &str, metadata: Option<Metadata>) -> Result<String, RagError> {
        let document = self.prepare(text, metadata).await?;
        let id = document.id.clone();

        self.store.insert(document).await?;
        tracing::info!(id = %id, chars = text.chars().count(), "document ingested");
        Ok(id)
    }

    /// Embeds every document first, then stores them in one transaction.
    pub async fn add_documents(&self, documents: Vec<NewDocument>) -> Result<Vec<String>, RagError> {
        if documents.is_empty() {
            return Err(RagError::Validation("no documents supplied".to_string()));
        }
        if let Some(idx) = documents.iter().position(|doc| doc.text.trim().is_empty()) {
            return Err(RagError::Validation(format!(
                "document {} has empty text",
                idx
            )));
        }

        let mut prepared = Vec::with_capacity(documents.len());
        for doc in documents {
            prepared.push(self.prepare(&doc.text, doc.metadata).await?);
        }
        let ids: Vec<String> = prepared.iter().map(|doc| doc.id.clone()).collect();

        self.store.insert_batch(prepared).await?;
        tracing::info!(count = ids.len(), "document batch ingested");
        Ok(ids)
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>, RagError> {
        self.store.list_all().await
    }

    pub async fn document_count(&self) -> Result<usize, RagError> {
        self.store.count().await
    }

    pub async fn chat(&self, query_text: &str, n_results: i64) -> Result<ChatExchange, RagError> {
        tracing::debug!(stage = %ChatStage::ReceiveQuery, n_results, "chat request");
        if query_text.trim().is_empty() {
            return Err(RagError::Validation("query must not be empty".to_string()));
        }
        let completion = self.completion.as_ref().ok_or_else(|| {
            RagError::Configuration("OPENAI_API_KEY is not configured; chat is unavailable".to_string())
        })?;

        tracing::debug!(stage = %ChatStage::Retrieve, "retrieving context");
        let retrieved = self.retriever.retrieve(query_text, n_results).await.map_err(|err| {
            tracing::warn!(stage = %ChatStage::Retrieve, error = %err, "chat failed");
            err
        })?;

        tracing::debug!(stage = %ChatStage::Assemble, documents = retrieved.len(), "assembling context");
        let context = ContextAssembler::assemble(&retrieved);
        let context_used = !context.is_empty();
        let prompt = ContextAssembler::build_prompt(&context, query_text);

        tracing::debug!(stage = %ChatStage::Complete, provider = completion.name(), "requesting completion");
        let answer = match completion.complete(&prompt.system, &prompt.user).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(stage = %ChatStage::Complete, error = %err, "completion failed, returning error text as answer");
                completion_failure_answer(&err)
            }
        };

        tracing::info!(stage = %ChatStage::Respond, context_used, documents = retrieved.len(), "chat answered");
        Ok(ChatExchange {
            query_text: query_text.to_string(),
            context,
            answer,
            context_used,
        })
    }

    async fn prepare(&self, text: &str, metadata: Option<Metadata>) -> Result<Document, RagError> {
        if text.trim().is_empty() {
            return Err(RagError::Validation("document text must not be empty".to_string()));
        }
        let embedding = self.embedder.embed(text).await?;

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            metadata: metadata.unwrap_or_default(),
            embedding,
        })
    }
}
