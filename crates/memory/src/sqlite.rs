//! SQLite store — the durable, process-wide shared memory backend.
//!
//! A single database file with one `memories` table. Embeddings are
//! computed at save time and stored as little-endian f32 blobs; queries
//! load embedded rows and rank them in process. Plain INSERTs keep the
//! log accretive: identical content always gets a fresh row and id.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use cipher_core::error::MemoryError;
use cipher_core::memory::{MemoryRecord, MemoryStore, RetentionPolicy, SAVED_AT_KEY};

use crate::embedding::{Embedder, HashEmbedder};
use crate::vector::rank_by_similarity;

/// A durable SQLite memory store.
pub struct SqliteStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    retention: RetentionPolicy,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::StoreUnavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::StoreUnavailable(format!("Failed to open SQLite: {e}")))?;

        let store = Self {
            pool,
            embedder: Arc::new(HashEmbedder::default()),
            retention: RetentionPolicy::Unbounded,
        };
        store.run_migrations().await?;
        info!("SQLite memory store initialized at {path}");
        Ok(store)
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                iid        INTEGER PRIMARY KEY AUTOINCREMENT,
                id         TEXT UNIQUE NOT NULL,
                content    TEXT NOT NULL,
                metadata   TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                embedding  BLOB
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("memories table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("created_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryRecord, MemoryError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| MemoryError::QueryFailed(format!("id column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let metadata_json: String = row
            .try_get("metadata")
            .map_err(|e| MemoryError::QueryFailed(format!("metadata column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| MemoryError::QueryFailed(format!("created_at column: {e}")))?;

        let metadata: Map<String, Value> = serde_json::from_str(&metadata_json).unwrap_or_default();

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let embedding: Option<Vec<u8>> = row.try_get("embedding").ok();
        let embedding = embedding.map(|blob| {
            blob.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        });

        Ok(MemoryRecord {
            id,
            content,
            metadata,
            created_at,
            score: 0.0,
            embedding,
        })
    }

    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    async fn apply_retention(&self) -> Result<(), MemoryError> {
        let RetentionPolicy::MaxRecords(cap) = self.retention else {
            return Ok(());
        };

        let total = self.count().await?;
        if total <= cap {
            return Ok(());
        }
        let excess = (total - cap) as i64;

        sqlx::query(
            "DELETE FROM memories WHERE iid IN \
             (SELECT iid FROM memories ORDER BY iid ASC LIMIT ?1)",
        )
        .bind(excess)
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("Retention sweep: {e}")))?;

        debug!(dropped = excess, cap, "Retention cap applied");
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn save(
        &self,
        content: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<String, MemoryError> {
        let id = format!("mem_{}", Uuid::new_v4());
        let now = Utc::now();

        let mut metadata = metadata.unwrap_or_default();
        metadata.insert(SAVED_AT_KEY.into(), Value::String(now.to_rfc3339()));
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| MemoryError::QueryFailed(format!("Metadata serialization: {e}")))?;

        let embedding = self.embedder.embed(content);
        let blob = Self::embedding_to_blob(&embedding);

        sqlx::query(
            "INSERT INTO memories (id, content, metadata, created_at, embedding) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(content)
        .bind(&metadata_json)
        .bind(now.to_rfc3339())
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::StoreUnavailable(format!("INSERT failed: {e}")))?;

        self.apply_retention().await?;

        debug!(memory_id = %id, "Stored memory");
        Ok(id)
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let rows = sqlx::query("SELECT * FROM memories WHERE embedding IS NOT NULL")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("Embedding scan: {e}")))?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<MemoryRecord> = rows
            .iter()
            .filter_map(|row| Self::row_to_record(row).ok())
            .collect();

        let query_embedding = self.embedder.embed(text);
        Ok(rank_by_similarity(&records, &query_embedding, top_k))
    }

    async fn list_all(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        let rows = sqlx::query("SELECT * FROM memories ORDER BY iid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("List all: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM memories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| MemoryError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn save_and_list() {
        let store = test_store().await;
        let id = store
            .save("Rust is a systems programming language", None)
            .await
            .unwrap();
        assert!(id.starts_with("mem_"));

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].content, "Rust is a systems programming language");
    }

    #[tokio::test]
    async fn identical_content_gets_distinct_ids() {
        let store = test_store().await;
        let a = store.save("duplicate content", None).await.unwrap();
        let b = store.save("duplicate content", None).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn metadata_round_trip_with_stamp() {
        let store = test_store().await;
        let mut metadata = Map::new();
        metadata.insert("topic".into(), Value::String("finance".into()));
        store.save("NVDA closed up", Some(metadata)).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].metadata["topic"], "finance");
        assert!(all[0].metadata.contains_key(SAVED_AT_KEY));
    }

    #[tokio::test]
    async fn metadata_stamped_even_when_none_supplied() {
        let store = test_store().await;
        store.save("bare save", None).await.unwrap();
        let all = store.list_all().await.unwrap();
        assert!(!all[0].metadata.is_empty());
        assert!(all[0].metadata.contains_key(SAVED_AT_KEY));
    }

    #[tokio::test]
    async fn save_then_query_round_trip() {
        let store = test_store().await;
        store
            .save("The user watches NVDA and GOOGL stock prices", None)
            .await
            .unwrap();
        store
            .save("A good pizza dough rests for two days", None)
            .await
            .unwrap();

        let results = store.query("NVDA GOOGL stock", 5).await.unwrap();
        assert!(!results.is_empty());
        assert!(results[0].content.contains("NVDA"));
    }

    #[tokio::test]
    async fn empty_store_query_is_empty() {
        let store = test_store().await;
        let results = store.query("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn embedding_blob_round_trip() {
        let store = test_store().await;
        store.save("embedded row", None).await.unwrap();
        let all = store.list_all().await.unwrap();
        let embedding = all[0].embedding.as_ref().unwrap();
        assert_eq!(embedding.len(), crate::embedding::DEFAULT_DIM);
    }

    #[tokio::test]
    async fn retention_cap_drops_oldest() {
        let store = test_store().await.with_retention(RetentionPolicy::MaxRecords(2));
        store.save("first", None).await.unwrap();
        store.save("second", None).await.unwrap();
        store.save("third", None).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let contents: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert_eq!(contents, vec!["second", "third"]);
    }

    #[tokio::test]
    async fn list_all_preserves_insertion_order() {
        let store = test_store().await;
        for i in 0..5 {
            store.save(&format!("entry {i}"), None).await.unwrap();
        }
        let contents: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert_eq!(
            contents,
            vec!["entry 0", "entry 1", "entry 2", "entry 3", "entry 4"]
        );
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = format!("sqlite://{}/mem.db", dir.path().display());

        {
            let store = SqliteStore::new(&path).await.unwrap();
            store.save("durable fact", None).await.unwrap();
        }

        let reopened = SqliteStore::new(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let results = reopened.query("durable fact", 5).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn store_name() {
        let store = test_store().await;
        assert_eq!(store.name(), "sqlite");
    }
}
