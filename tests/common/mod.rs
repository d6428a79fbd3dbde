#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rag_chat_backend::core::config::Settings;
use rag_chat_backend::llm::{CompletionClient, CompletionError};
use rag_chat_backend::rag::{Embedder, HashingEmbedder, RagService, SqliteVectorStore};
use rag_chat_backend::state::AppState;

/// Completion backend double: answers with a fixed reply and records prompts.
pub struct StubCompletion {
    reply: Result<String, CompletionError>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl StubCompletion {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: CompletionError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn last_system_prompt(&self) -> String {
        self.calls.lock().unwrap().last().map(|(s, _)| s.clone()).unwrap()
    }
}

#[async_trait]
impl CompletionClient for StubCompletion {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, system_message: &str, user_message: &str) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_message.to_string(), user_message.to_string()));
        self.reply.clone()
    }
}

pub async fn open_store(dir: &tempfile::TempDir, embedder: &dyn Embedder) -> Arc<SqliteVectorStore> {
    Arc::new(SqliteVectorStore::open(&dir.path().join("vector_store"), embedder).await.unwrap())
}

pub async fn rag_service(dir: &tempfile::TempDir, completion: Option<Arc<StubCompletion>>) -> RagService {
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(384));
    let store = open_store(dir, embedder.as_ref()).await;
    RagService::new(
        embedder,
        store,
        completion.map(|c| c as Arc<dyn CompletionClient>),
    )
}

pub async fn app_state(dir: &tempfile::TempDir, completion: Option<Arc<StubCompletion>>) -> Arc<AppState> {
    let settings = Arc::new(Settings::default());
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(settings.embedding_dimensions()));
    let store = open_store(dir, embedder.as_ref()).await;

    AppState::assemble(
        settings,
        embedder,
        store,
        completion.map(|c| c as Arc<dyn CompletionClient>),
    )
}
