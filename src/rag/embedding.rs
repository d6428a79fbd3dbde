//! Text embedders.
//!
//! Every store is pinned to exactly one embedder (model id + dimension), so an
//! embedder must be a pure function of its input for a fixed model version.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::error::RagError;
use crate::core::config::Settings;
use crate::llm::OpenAiClient;
use crate::vector_math;

/// Model id of the built-in [`HashingEmbedder`].
pub const HASHING_MODEL_ID: &str = "hashing-v1";

/// Default character limit for a single embedding input.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8192;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier recorded next to the vectors this embedder produces.
    fn model_id(&self) -> &str;

    /// Length of every vector returned by [`Embedder::embed`].
    fn dimensions(&self) -> usize;

    /// Fails with [`RagError::Embedding`] on empty or over-long text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

fn check_input(text: &str, max_chars: usize) -> Result<(), RagError> {
    if text.trim().is_empty() {
        return Err(RagError::Embedding("cannot embed empty text".to_string()));
    }
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(RagError::Embedding(format!(
            "text is {} characters, limit is {}",
            chars, max_chars
        )));
    }
    Ok(())
}

/// Offline feature-hashing embedder.
///
/// Lower-cased alphanumeric tokens are hashed into `dimensions` signed
/// buckets and the result is L2-normalised, so texts sharing vocabulary have
/// high cosine similarity. Needs no model download or credential.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    max_chars: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            max_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
    }

    /// Fails on text with no alphanumeric token: it would hash to the zero
    /// vector, which scores 0 against every document.
    fn vectorize(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vector = vec![0.0f32; self.dimensions];
        let mut token_count = 0usize;

        for token in Self::tokens(text) {
            token_count += 1;
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        if token_count == 0 {
            return Err(RagError::Embedding(
                "text contains no words or numbers to embed".to_string(),
            ));
        }

        vector_math::normalize(&mut vector);
        Ok(vector)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        HASHING_MODEL_ID
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        check_input(text, self.max_chars)?;
        self.vectorize(text)
    }
}

/// Embedder backed by an OpenAI-compatible `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model_id: String,
    dimensions: usize,
    max_chars: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient, model_id: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            dimensions,
            max_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        check_input(text, self.max_chars)?;

        let mut vectors = self
            .client
            .embed(&[text.to_string()], &self.model_id)
            .await
            .map_err(RagError::embedding)?;
        let vector = vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("embedding endpoint returned no vector".to_string()))?;

        if vector.len() != self.dimensions {
            return Err(RagError::Embedding(format!(
                "model {} returned {} dimensions, expected {}",
                self.model_id,
                vector.len(),
                self.dimensions
            )));
        }
        Ok(vector)
    }
}

/// Picks the embedder named by `rag.embedding_model`.
///
/// The hashing model runs locally; any other id is treated as a remote
/// OpenAI embedding model and needs the API key.
pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>, RagError> {
    let model = settings.rag.embedding_model.trim();
    let dimensions = settings.embedding_dimensions();

    if model == HASHING_MODEL_ID {
        return Ok(Arc::new(HashingEmbedder::new(dimensions)));
    }

    let client = OpenAiClient::from_settings(&settings.llm).ok_or_else(|| {
        RagError::Configuration(format!(
            "embedding model '{}' requires OPENAI_API_KEY",
            model
        ))
    })?;
    Ok(Arc::new(OpenAiEmbedder::new(client, model, dimensions)))
}
