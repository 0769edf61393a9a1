//! Chunk persistence backends.
//!
//! The [`ChunkStore`] trait abstracts over storage implementations so the
//! retrieval service can run against an in-memory store in tests and SQLite
//! in deployments without code changes:
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │ ChunkStore trait │
//!                  │   (async CRUD)   │
//!                  └────────┬─────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!     ┌──────────────────┐      ┌──────────────────┐
//!     │ MemoryChunkStore │      │ SqliteChunkStore │
//!     │  (parking_lot)   │      │ (tokio-rusqlite) │
//!     └──────────────────┘      └──────────────────┘
//! ```
//!
//! Stores hold no derived logic beyond filtering by an indexed key and an
//! optional section label; scoring and ranking live in
//! [`similarity`](crate::similarity).

pub mod memory;
pub mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::sections::Section;
use crate::types::{Chunk, NewChunk, RetrievalError};

pub use memory::MemoryChunkStore;
pub use sqlite::SqliteChunkStore;

/// Async persistence interface for chunks.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Bulk-inserts a batch of chunks, assigning ids, and returns the saved
    /// records.
    ///
    /// The batch is validated up front (see [`validate_batch`]); a rejected
    /// batch writes nothing. Partial-failure cleanup across *separate* calls
    /// remains the caller's job: delete the document's chunks and re-ingest.
    async fn save(&self, chunks: Vec<NewChunk>) -> Result<Vec<Chunk>, RetrievalError>;

    /// Fetches all chunks of a document, optionally restricted to a section,
    /// ordered by `position`.
    async fn find_by_document(
        &self,
        document_id: &str,
        section: Option<Section>,
    ) -> Result<Vec<Chunk>, RetrievalError>;

    /// Fetches all chunks owned by a user, optionally restricted to a
    /// section.
    async fn find_by_owner(
        &self,
        owner_id: &str,
        section: Option<Section>,
    ) -> Result<Vec<Chunk>, RetrievalError>;

    /// Deletes every chunk of a document, returning the number removed.
    async fn delete_by_document(&self, document_id: &str) -> Result<usize, RetrievalError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, RetrievalError>;
}

/// Save-time invariants shared by every backend.
///
/// Rejects chunks with empty text or empty embeddings, and batches whose
/// embeddings disagree in length for the same model. Malformed rows are
/// refused at the door rather than tolerated forever in storage; the
/// query-time skip in ranking only remains as a guard against rows written
/// by older tooling.
pub fn validate_batch(chunks: &[NewChunk]) -> Result<(), RetrievalError> {
    let mut lengths_by_model: HashMap<&str, usize> = HashMap::new();

    for chunk in chunks {
        if chunk.text.trim().is_empty() {
            return Err(RetrievalError::Validation(format!(
                "chunk at position {} of document {} has empty text",
                chunk.position, chunk.document_id
            )));
        }
        if chunk.embedding.is_empty() {
            return Err(RetrievalError::Validation(format!(
                "chunk at position {} of document {} has an empty embedding",
                chunk.position, chunk.document_id
            )));
        }
        match lengths_by_model.get(chunk.embedding_model.as_str()) {
            Some(&expected) if expected != chunk.embedding.len() => {
                return Err(RetrievalError::Validation(format!(
                    "embedding length {} for model {} conflicts with earlier length {} in batch",
                    chunk.embedding.len(),
                    chunk.embedding_model,
                    expected
                )));
            }
            Some(_) => {}
            None => {
                lengths_by_model.insert(&chunk.embedding_model, chunk.embedding.len());
            }
        }
    }

    Ok(())
}
