//! In-memory chunk store for tests and small deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{ChunkStore, validate_batch};
use crate::sections::Section;
use crate::types::{Chunk, NewChunk, RetrievalError};

/// Thread-safe in-memory [`ChunkStore`].
///
/// Backed by a `parking_lot::RwLock`, so concurrent searches read without
/// blocking each other; writes only happen during ingestion and deletion.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn save(&self, chunks: Vec<NewChunk>) -> Result<Vec<Chunk>, RetrievalError> {
        validate_batch(&chunks)?;

        let saved: Vec<Chunk> = chunks
            .into_iter()
            .map(|chunk| chunk.into_chunk(Uuid::new_v4().to_string()))
            .collect();

        self.chunks.write().extend(saved.iter().cloned());
        Ok(saved)
    }

    async fn find_by_document(
        &self,
        document_id: &str,
        section: Option<Section>,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        let guard = self.chunks.read();
        let mut found: Vec<Chunk> = guard
            .iter()
            .filter(|chunk| chunk.document_id == document_id)
            .filter(|chunk| section.is_none_or(|wanted| chunk.section == wanted))
            .cloned()
            .collect();
        found.sort_by_key(|chunk| chunk.position);
        Ok(found)
    }

    async fn find_by_owner(
        &self,
        owner_id: &str,
        section: Option<Section>,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        let guard = self.chunks.read();
        Ok(guard
            .iter()
            .filter(|chunk| chunk.owner_id == owner_id)
            .filter(|chunk| section.is_none_or(|wanted| chunk.section == wanted))
            .cloned()
            .collect())
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<usize, RetrievalError> {
        let mut guard = self.chunks.write();
        let before = guard.len();
        guard.retain(|chunk| chunk.document_id != document_id);
        Ok(before - guard.len())
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        Ok(self.chunks.read().len())
    }
}
