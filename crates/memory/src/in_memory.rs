//! In-memory store — for tests and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use cipher_core::error::MemoryError;
use cipher_core::memory::{MemoryRecord, MemoryStore, RetentionPolicy, SAVED_AT_KEY};

use crate::embedding::{Embedder, HashEmbedder};
use crate::vector::rank_by_similarity;

/// A store backed by a Vec behind an RwLock.
///
/// Shares the accretive-log semantics of the durable backends: appends
/// only, no in-place mutation, so concurrent readers never observe a
/// half-written record.
pub struct InMemoryStore {
    records: RwLock<Vec<MemoryRecord>>,
    embedder: Arc<dyn Embedder>,
    retention: RetentionPolicy,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            embedder: Arc::new(HashEmbedder::default()),
            retention: RetentionPolicy::Unbounded,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
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

        let record = MemoryRecord {
            id: id.clone(),
            content: content.to_string(),
            metadata,
            created_at: now,
            score: 0.0,
            embedding: Some(self.embedder.embed(content)),
        };

        let mut records = self.records.write().await;
        records.push(record);
        if let RetentionPolicy::MaxRecords(cap) = self.retention {
            while records.len() > cap {
                records.remove(0);
            }
        }

        Ok(id)
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed(text);
        Ok(rank_by_similarity(&records, &query_embedding, top_k))
    }

    async fn list_all(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(self.records.read().await.clone())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.read().await.len())
    }
}
