use std::sync::Arc;

use crate::core::config::{AppPaths, Settings};
use crate::llm::{CompletionClient, OpenAiClient};
use crate::rag::{build_embedder, Embedder, RagService, SqliteVectorStore};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Every component is constructed once here and handed out by reference;
/// the embedder and store are pinned to each other for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub rag: Arc<RagService>,
    store: Arc<SqliteVectorStore>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Builds the embedder named in settings
    /// 2. Opens the vector store under the persistence directory, pinned to that embedder
    /// 3. Builds the completion client if a credential is present
    pub async fn initialize(
        paths: &AppPaths,
        settings: Arc<Settings>,
    ) -> Result<Arc<Self>, InitializationError> {
        let embedder = build_embedder(&settings).map_err(InitializationError::Embedder)?;

        let persist_dir = settings.persist_dir(paths);
        let store = Arc::new(
            SqliteVectorStore::open(&persist_dir, embedder.as_ref())
                .await
                .map_err(InitializationError::Store)?,
        );
        tracing::info!(
            path = %store.db_path().display(),
            embedding_model = embedder.model_id(),
            dimensions = embedder.dimensions(),
            "vector store opened"
        );

        let completion = OpenAiClient::from_settings(&settings.llm)
            .map(|client| Arc::new(client) as Arc<dyn CompletionClient>);
        if completion.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; chat requests will fail until it is configured");
        }

        Ok(Self::assemble(settings, embedder, store, completion))
    }

    /// Wires already-constructed components together.
    pub fn assemble(
        settings: Arc<Settings>,
        embedder: Arc<dyn Embedder>,
        store: Arc<SqliteVectorStore>,
        completion: Option<Arc<dyn CompletionClient>>,
    ) -> Arc<Self> {
        let rag = Arc::new(RagService::new(embedder, store.clone(), completion));
        Arc::new(AppState {
            settings,
            rag,
            store,
        })
    }

    /// Releases the store's connections. Committed writes are already durable.
    pub async fn shutdown(&self) {
        self.store.close().await;
        tracing::info!("vector store closed");
    }
}
