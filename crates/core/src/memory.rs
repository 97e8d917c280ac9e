//! Memory store trait — durable, semantically searchable knowledge.
//!
//! The memory store is an accretive log shared process-wide across
//! sessions: records are created on save, never updated in place, and the
//! base contract has no delete. Queries rank by semantic similarity with
//! a most-recent-first tie-break and degrade gracefully to an empty
//! sequence on an empty store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MemoryError;

/// Metadata key auto-stamped on every save, guaranteeing metadata is
/// never empty.
pub const SAVED_AT_KEY: &str = "saved_at";

/// A single durable memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique ID, assigned at save time ("mem_<uuid>")
    pub id: String,

    /// The remembered text
    pub content: String,

    /// Arbitrary scalar metadata; always contains [`SAVED_AT_KEY`]
    pub metadata: Map<String, Value>,

    /// When this record was created
    pub created_at: DateTime<Utc>,

    /// Similarity score (set by query operations)
    #[serde(default)]
    pub score: f32,

    /// Embedding vector, derived at save time (never user-supplied)
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

/// Retention policy for the accretive log.
///
/// The observed upstream design grows without bound; the policy makes
/// that explicit and gives operators an opt-in cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Keep everything (the default).
    #[default]
    Unbounded,
    /// Keep at most this many records, dropping the oldest on save.
    MaxRecords(usize),
}

/// The core MemoryStore trait.
///
/// Implementations: SQLite (durable), in-memory (tests / ephemeral runs).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Persist a new record, returning its id. Saving identical content
    /// twice produces two distinct records — no dedup.
    async fn save(
        &self,
        content: &str,
        metadata: Option<Map<String, Value>>,
    ) -> std::result::Result<String, MemoryError>;

    /// The `top_k` most similar records, descending similarity, ties
    /// broken most-recent first. Empty store → empty Vec, not an error.
    async fn query(
        &self,
        text: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Every stored record, for inspection tooling.
    async fn list_all(&self) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Total record count.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;
}
