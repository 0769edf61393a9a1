//! Core domain types shared across the retrieval pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sections::Section;

/// A persisted slice of résumé text paired with its embedding vector.
///
/// Chunks are created in a batch when a document is ingested, are never
/// updated in place, and are deleted in bulk when the parent document goes
/// away. `position` is assigned once at creation and never renumbered, so
/// gaps may appear after partial deletions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier, assigned by the store at save time.
    pub id: String,
    /// Owning document reference; many chunks per document.
    pub document_id: String,
    /// Owner of the parent document, duplicated here for per-user queries.
    pub owner_id: String,
    /// Literal chunk content; always non-empty once persisted.
    pub text: String,
    /// Fixed-length embedding vector produced by `embedding_model`.
    pub embedding: Vec<f32>,
    /// Identifier of the model that produced `embedding`.
    pub embedding_model: String,
    /// Coarse résumé section this chunk belongs to.
    pub section: Section,
    /// Zero-based ordinal of the chunk within its source document.
    pub position: usize,
}

/// Input record for [`ChunkStore::save`](crate::stores::ChunkStore::save);
/// identical to [`Chunk`] minus the store-assigned id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewChunk {
    pub document_id: String,
    pub owner_id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub embedding_model: String,
    pub section: Section,
    pub position: usize,
}

impl NewChunk {
    /// Materializes the chunk with a store-assigned id.
    pub(crate) fn into_chunk(self, id: String) -> Chunk {
        Chunk {
            id,
            document_id: self.document_id,
            owner_id: self.owner_id,
            text: self.text,
            embedding: self.embedding,
            embedding_model: self.embedding_model,
            section: self.section,
            position: self.position,
        }
    }
}

/// A chunk annotated with its similarity to a query embedding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1], modulo floating-point error.
    pub similarity: f32,
}

/// Error taxonomy for the retrieval core.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Missing or malformed caller input. Never retried.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Two embeddings of different lengths were compared pairwise.
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// The embedding provider failed; fatal for the current call.
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// The chunk store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Provider(err.to_string())
    }
}

impl From<tokio_rusqlite::Error> for RetrievalError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        RetrievalError::Storage(err.to_string())
    }
}
