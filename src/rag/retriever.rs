use std::sync::Arc;

use super::document::RetrievalResult;
use super::embedding::Embedder;
use super::error::RagError;
use super::store::VectorStore;

pub const DEFAULT_RESULTS: i64 = 3;
pub const MAX_RESULTS: usize = 5;

/// Clamps a caller-requested result count into `1..=MAX_RESULTS`.
pub fn clamp_results(requested: i64) -> usize {
    requested.clamp(1, MAX_RESULTS as i64) as usize
}

/// Turns a query string into the store's nearest documents.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embeds `query_text` and returns up to `clamp_results(n_results)`
    /// documents in the store's similarity order. No re-ranking or dedup.
    pub async fn retrieve(&self, query_text: &str, n_results: i64) -> Result<RetrievalResult, RagError> {
        let embedding = self.embedder.embed(query_text).await?;
        let k = clamp_results(n_results);

        let results = self.store.query(&embedding, k).await?;
        tracing::debug!(requested = n_results, k, hits = results.len(), "retrieval complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::document::Document;
    use crate::rag::embedding::HashingEmbedder;
    use crate::rag::sqlite::SqliteVectorStore;

    async fn seeded(dir: &tempfile::TempDir, texts: &[&str]) -> Retriever {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(256));
        let store = SqliteVectorStore::open(dir.path(), embedder.as_ref()).await.unwrap();
        for (i, text) in texts.iter().enumerate() {
            store
                .insert(Document {
                    id: format!("doc-{}", i),
                    text: text.to_string(),
                    metadata: Default::default(),
                    embedding: embedder.embed(text).await.unwrap(),
                })
                .await
                .unwrap();
        }
        Retriever::new(embedder, Arc::new(store))
    }

    #[test]
    fn clamp_bounds_requests() {
        assert_eq!(clamp_results(-4), 1);
        assert_eq!(clamp_results(0), 1);
        assert_eq!(clamp_results(1), 1);
        assert_eq!(clamp_results(3), 3);
        assert_eq!(clamp_results(5), 5);
        assert_eq!(clamp_results(100), MAX_RESULTS);
    }

    #[tokio::test]
    async fn never_returns_more_than_cap_or_store_size() {
        let dir = tempfile::tempdir().unwrap();
        let texts = ["one apple", "two apples", "three apples", "four apples", "five apples", "six apples", "seven apples"];
        let retriever = seeded(&dir, &texts).await;

        for n in [1, 2, 5, 6, 100] {
            let results = retriever.retrieve("apples", n).await.unwrap();
            assert_eq!(results.len(), (n as usize).min(MAX_RESULTS).min(texts.len()));
        }
        assert_eq!(retriever.retrieve("apples", 0).await.unwrap().len(), 1);
        assert_eq!(retriever.retrieve("apples", -7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn results_are_in_non_increasing_similarity_order() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = seeded(
            &dir,
            &[
                "Bananas grow in tropical climates.",
                "Paris is the capital of France.",
                "France borders Spain.",
            ],
        )
        .await;

        let results = retriever.retrieve("What is the capital of France?", 5).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, "Paris is the capital of France.");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn embedding_errors_propagate_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let retriever = seeded(&dir, &["anything"]).await;

        let err = retriever.retrieve("   ", 3).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }
}
