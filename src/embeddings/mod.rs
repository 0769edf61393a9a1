//! Embedding provider abstraction and a deterministic mock for tests.
//!
//! The external embedding model is an opaque collaborator: given non-empty
//! text it returns a fixed-length `f32` vector. Providers are injected into
//! the [`RetrievalService`](crate::service::RetrievalService) explicitly
//! rather than living behind module-level singletons, so tests can substitute
//! doubles without touching global state.

pub mod http;

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use crate::types::RetrievalError;

pub use http::HttpEmbeddingProvider;

/// An external embedding model.
///
/// Implementations must be safe to share across concurrent searches; every
/// call is a self-contained request with no provider-side session state.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the model producing the vectors, recorded on each chunk
    /// for future re-embedding decisions.
    fn model(&self) -> &str;

    /// Embeds a single non-empty text.
    ///
    /// # Errors
    ///
    /// Empty or whitespace-only input, and an empty provider response, are
    /// both errors; the caller never receives a zero-length vector silently.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    /// Embeds a batch of texts, preserving input order.
    ///
    /// The default implementation loops over [`embed`](Self::embed);
    /// providers with a native batch endpoint should override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Deterministic hash-derived embeddings for tests and offline development.
///
/// Identical text always maps to the identical vector; different texts map to
/// different vectors with overwhelming probability. The vectors carry no
/// semantic signal, which is fine for exercising chunking, persistence, and
/// ranking mechanics.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimension: 16 }
    }

    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn model(&self) -> &str {
        "mock-embedding"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        if text.trim().is_empty() {
            return Err(RetrievalError::Validation(
                "cannot embed empty text".into(),
            ));
        }

        let mut vector = Vec::with_capacity(self.dimension);
        for lane in 0..self.dimension {
            // DefaultHasher::new() uses fixed keys, so this is stable across
            // runs and processes.
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            lane.hash(&mut hasher);
            let raw = hasher.finish();
            // Map the hash onto [-1, 1].
            let unit = (raw as f64) / (u64::MAX as f64);
            vector.push((unit * 2.0 - 1.0) as f32);
        }
        Ok(vector)
    }
}
