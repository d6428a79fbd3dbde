//! SQLite-backed vector store.
//!
//! Documents live in one table with their embedding as a little-endian f32
//! blob; search is brute-force cosine similarity. The embedder's model id and
//! dimension are recorded in `rag_meta` on first open and checked on every
//! later open, so one store never mixes embedding spaces.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::document::{Document, DocumentSummary, Metadata, RetrievedDocument};
use super::embedding::Embedder;
use super::error::RagError;
use super::store::VectorStore;
use crate::vector_math::rank_descending_by_cosine;

pub const DB_FILE_NAME: &str = "documents.db";

const META_MODEL_KEY: &str = "embedding_model";
const META_DIMENSIONS_KEY: &str = "embedding_dimensions";

pub struct SqliteVectorStore {
    pool: SqlitePool,
    db_path: PathBuf,
    dimensions: usize,
}

impl SqliteVectorStore {
    /// Opens (or creates) `<persist_dir>/documents.db` pinned to `embedder`.
    pub async fn open(persist_dir: &Path, embedder: &dyn Embedder) -> Result<Self, RagError> {
        tokio::fs::create_dir_all(persist_dir)
            .await
            .map_err(RagError::store)?;
        Self::with_path(
            persist_dir.join(DB_FILE_NAME),
            embedder.model_id(),
            embedder.dimensions(),
        )
        .await
    }

    pub async fn with_path(db_path: PathBuf, model_id: &str, dimensions: usize) -> Result<Self, RagError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(RagError::store)?;

        let store = Self {
            pool,
            db_path,
            dimensions,
        };
        store.init_schema().await?;
        store.pin_embedder(model_id, dimensions).await?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Flushes and closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<(), RagError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::store)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::store)?;

        Ok(())
    }

    async fn pin_embedder(&self, model_id: &str, dimensions: usize) -> Result<(), RagError> {
        let mut tx = self.pool.begin().await.map_err(RagError::store)?;

        for (key, value) in [
            (META_MODEL_KEY, model_id.to_string()),
            (META_DIMENSIONS_KEY, dimensions.to_string()),
        ] {
            sqlx::query("INSERT OR IGNORE INTO rag_meta (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(&value)
                .execute(&mut *tx)
                .await
                .map_err(RagError::store)?;

            let stored: String = sqlx::query_scalar("SELECT value FROM rag_meta WHERE key = ?1")
                .bind(key)
                .fetch_one(&mut *tx)
                .await
                .map_err(RagError::store)?;

            if stored != value {
                return Err(RagError::Configuration(format!(
                    "vector store {} was built with {} = {}, refusing to open it with {}",
                    self.db_path.display(),
                    key,
                    stored,
                    value
                )));
            }
        }

        tx.commit().await.map_err(RagError::store)?;
        Ok(())
    }

    /// Fetches a full document, embedding included.
    pub async fn get(&self, id: &str) -> Result<Option<Document>, RagError> {
        let row = sqlx::query(
            "SELECT id, text, metadata, embedding FROM rag_documents WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RagError::store)?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<(), RagError> {
        if embedding.len() != self.dimensions {
            return Err(RagError::Embedding(format!(
                "embedding has {} dimensions, store expects {}",
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Result<Vec<f32>, RagError> {
        if bytes.len() % 4 != 0 {
            return Err(RagError::StoreUnavailable(format!(
                "corrupt embedding blob of {} bytes",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    fn serialize_metadata(metadata: &Metadata) -> Result<String, RagError> {
        serde_json::to_string(metadata).map_err(RagError::store)
    }

    fn deserialize_metadata(raw: &str) -> Result<Metadata, RagError> {
        serde_json::from_str(raw).map_err(|e| RagError::StoreUnavailable(format!("corrupt metadata: {}", e)))
    }

    fn row_to_document(row: &SqliteRow) -> Result<Document, RagError> {
        let metadata: String = row.try_get("metadata").map_err(RagError::store)?;
        let embedding: Vec<u8> = row.try_get("embedding").map_err(RagError::store)?;

        Ok(Document {
            id: row.try_get("id").map_err(RagError::store)?,
            text: row.try_get("text").map_err(RagError::store)?,
            metadata: Self::deserialize_metadata(&metadata)?,
            embedding: Self::deserialize_embedding(&embedding)?,
        })
    }

    fn map_insert_error(err: sqlx::Error, id: &str) -> RagError {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => RagError::DuplicateId(id.to_string()),
            _ => RagError::store(err),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn insert(&self, document: Document) -> Result<(), RagError> {
        self.check_dimensions(&document.embedding)?;
        let blob = Self::serialize_embedding(&document.embedding);
        let metadata = Self::serialize_metadata(&document.metadata)?;

        sqlx::query(
            "INSERT INTO rag_documents (id, text, metadata, embedding) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&document.id)
        .bind(&document.text)
        .bind(&metadata)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(e, &document.id))?;

        Ok(())
    }

    async fn insert_batch(&self, documents: Vec<Document>) -> Result<(), RagError> {
        if documents.is_empty() {
            return Ok(());
        }
        for document in &documents {
            self.check_dimensions(&document.embedding)?;
        }

        let mut tx = self.pool.begin().await.map_err(RagError::store)?;

        for document in &documents {
            let blob = Self::serialize_embedding(&document.embedding);
            let metadata = Self::serialize_metadata(&document.metadata)?;

            sqlx::query(
                "INSERT INTO rag_documents (id, text, metadata, embedding) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&document.id)
            .bind(&document.text)
            .bind(&metadata)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::map_insert_error(e, &document.id))?;
        }

        tx.commit().await.map_err(RagError::store)?;
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>, RagError> {
        self.check_dimensions(embedding)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        // A single statement reads from one snapshot, so concurrent inserts
        // are either fully visible or not at all.
        let rows = sqlx::query(
            "SELECT id, text, metadata, embedding FROM rag_documents ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RagError::store)?;

        let mut documents = rows
            .iter()
            .map(Self::row_to_document)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();

        let candidates: Vec<Vec<f32>> = documents
            .iter()
            .flatten()
            .map(|doc| doc.embedding.clone())
            .collect();

        let results = rank_descending_by_cosine(embedding, &candidates)
            .into_iter()
            .take(k)
            .filter_map(|(idx, score)| {
                documents[idx].take().map(|doc| RetrievedDocument {
                    id: doc.id,
                    text: doc.text,
                    metadata: doc.metadata,
                    score,
                })
            })
            .collect();

        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<DocumentSummary>, RagError> {
        let rows = sqlx::query("SELECT id, metadata FROM rag_documents ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .map_err(RagError::store)?;

        rows.iter()
            .map(|row| {
                let metadata: String = row.try_get("metadata").map_err(RagError::store)?;
                Ok(DocumentSummary {
                    id: row.try_get("id").map_err(RagError::store)?,
                    metadata: Self::deserialize_metadata(&metadata)?,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize, RagError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_documents")
            .fetch_one(&self.pool)
            .await
            .map_err(RagError::store)?;

        Ok(count as usize)
    }
}
