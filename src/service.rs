//! Retrieval service: ingest, search, and delete orchestration.

use std::sync::Arc;

use crate::chunker::{ChunkerConfig, chunk_text};
use crate::embeddings::EmbeddingProvider;
use crate::sections::{Section, infer_section};
use crate::similarity::rank_chunks;
use crate::stores::ChunkStore;
use crate::types::{Chunk, NewChunk, RankedChunk, RetrievalError};

/// Default number of results returned by [`RetrievalService::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Candidate scope for a search: one document or everything a user owns.
///
/// Both scopes share scoring and ranking; only the candidate-fetch predicate
/// differs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchScope {
    Document(String),
    Owner(String),
}

/// Parameters for [`RetrievalService::search`].
#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub scope: SearchScope,
    pub query: String,
    /// Maximum results to return; defaults to [`DEFAULT_SEARCH_LIMIT`].
    pub limit: Option<usize>,
    /// Optional section filter applied at candidate fetch time.
    pub section: Option<Section>,
}

impl SearchRequest {
    /// Search within a single document.
    pub fn document(document_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            scope: SearchScope::Document(document_id.into()),
            query: query.into(),
            limit: None,
            section: None,
        }
    }

    /// Search across every document a user owns.
    pub fn owner(owner_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            scope: SearchScope::Owner(owner_id.into()),
            query: query.into(),
            limit: None,
            section: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }

    fn validate(&self) -> Result<(), RetrievalError> {
        match &self.scope {
            SearchScope::Document(id) if id.trim().is_empty() => {
                return Err(RetrievalError::Validation("document_id is required".into()));
            }
            SearchScope::Owner(id) if id.trim().is_empty() => {
                return Err(RetrievalError::Validation("owner_id is required".into()));
            }
            _ => {}
        }
        if self.query.trim().is_empty() {
            return Err(RetrievalError::Validation("query is required".into()));
        }
        if self.limit == Some(0) {
            return Err(RetrievalError::Validation("limit must be positive".into()));
        }
        Ok(())
    }
}

/// Orchestrates the retrieval pipeline: chunk → embed → persist on ingest,
/// embed → fetch → score → rank on search.
///
/// The embedding provider and chunk store are injected explicitly; the
/// service owns no hidden global clients, so tests substitute doubles freely
/// and concurrent searches never share mutable state.
pub struct RetrievalService {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn ChunkStore>,
    chunker: ChunkerConfig,
}

impl RetrievalService {
    /// Creates a service with the default chunker geometry.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn ChunkStore>) -> Self {
        Self {
            provider,
            store,
            chunker: ChunkerConfig::default(),
        }
    }

    /// Starts a builder for non-default configurations.
    pub fn builder() -> RetrievalServiceBuilder {
        RetrievalServiceBuilder::default()
    }

    /// Splits `text` with this service's chunker configuration.
    pub fn chunk(&self, text: &str) -> Result<Vec<String>, RetrievalError> {
        chunk_text(text, &self.chunker)
    }

    /// Chunks, embeds, and persists a document's extracted text.
    ///
    /// Positions are assigned contiguously from 0 in chunk order and each
    /// chunk is tagged with an inferred section. Whitespace-only text yields
    /// an empty vec without touching the provider or the store. There is no
    /// automatic rollback: if embedding or persistence fails partway, the
    /// caller cleans up with [`delete_for_document`](Self::delete_for_document)
    /// and re-ingests.
    pub async fn ingest(
        &self,
        document_id: &str,
        owner_id: &str,
        text: &str,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        if document_id.trim().is_empty() {
            return Err(RetrievalError::Validation("document_id is required".into()));
        }
        if owner_id.trim().is_empty() {
            return Err(RetrievalError::Validation("owner_id is required".into()));
        }

        let texts = chunk_text(text, &self.chunker)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.provider.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(RetrievalError::Provider(format!(
                "provider returned {} embeddings for {} chunks",
                embeddings.len(),
                texts.len()
            )));
        }

        let model = self.provider.model().to_string();
        let batch: Vec<NewChunk> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (text, embedding))| NewChunk {
                document_id: document_id.to_string(),
                owner_id: owner_id.to_string(),
                section: infer_section(&text),
                text,
                embedding,
                embedding_model: model.clone(),
                position,
            })
            .collect();

        let saved = self.store.save(batch).await?;
        tracing::debug!(
            document_id,
            owner_id,
            chunks = saved.len(),
            "document ingested"
        );
        Ok(saved)
    }

    /// Retrieves the chunks most similar to `request.query`.
    ///
    /// An empty candidate set is a legitimate "nothing indexed yet" state and
    /// returns an empty vec, not an error. Provider failures are fatal for
    /// the call; no partial or fallback ranking is attempted.
    pub async fn search(&self, request: SearchRequest) -> Result<Vec<RankedChunk>, RetrievalError> {
        request.validate()?;

        let query_embedding = self.provider.embed(&request.query).await?;

        let candidates = match &request.scope {
            SearchScope::Document(id) => self.store.find_by_document(id, request.section).await?,
            SearchScope::Owner(id) => self.store.find_by_owner(id, request.section).await?,
        };
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let limit = request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let ranked = rank_chunks(&query_embedding, candidates, limit);
        tracing::debug!(
            query = %request.query,
            results = ranked.len(),
            "search completed"
        );
        Ok(ranked)
    }

    /// Removes every chunk of a document, returning the number deleted.
    pub async fn delete_for_document(&self, document_id: &str) -> Result<usize, RetrievalError> {
        if document_id.trim().is_empty() {
            return Err(RetrievalError::Validation("document_id is required".into()));
        }
        self.store.delete_by_document(document_id).await
    }
}

/// Builder for [`RetrievalService`].
#[derive(Default)]
pub struct RetrievalServiceBuilder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn ChunkStore>>,
    chunker: Option<ChunkerConfig>,
}

impl RetrievalServiceBuilder {
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn ChunkStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn chunker(mut self, config: ChunkerConfig) -> Self {
        self.chunker = Some(config);
        self
    }

    /// Builds the service, validating the chunker geometry.
    ///
    /// # Errors
    ///
    /// Fails if the provider or store is missing, or if the chunker config is
    /// invalid.
    pub fn build(self) -> Result<RetrievalService, RetrievalError> {
        let provider = self
            .provider
            .ok_or_else(|| RetrievalError::Validation("embedding provider is required".into()))?;
        let store = self
            .store
            .ok_or_else(|| RetrievalError::Validation("chunk store is required".into()))?;
        let chunker = self.chunker.unwrap_or_default();
        chunker.validate()?;
        Ok(RetrievalService {
            provider,
            store,
            chunker,
        })
    }
}
