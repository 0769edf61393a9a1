//! Résumé chunking and semantic retrieval core.
//!
//! ```text
//! Document text ──► chunker ──► embeddings::EmbeddingProvider ──► stores::ChunkStore
//!                                                                       │
//! Query text ──► EmbeddingProvider ──► query vector                     │
//!                                          │                            │
//!                                          ▼                            ▼
//!                               similarity::rank_chunks ◄── candidate chunks
//!                                          │
//!                                          ▼
//!                               ranked chunks ──► caller
//! ```
//!
//! The surrounding application (authentication, résumé parsing, HTTP layer,
//! question generation) calls into this crate in process through
//! [`service::RetrievalService`] with document/owner ids and query strings,
//! and receives ranked chunks back. The embedding model itself stays an
//! external collaborator behind [`embeddings::EmbeddingProvider`].

pub mod chunker;
pub mod embeddings;
pub mod sections;
pub mod service;
pub mod similarity;
pub mod stores;
pub mod types;

pub use chunker::{ChunkerConfig, chunk_text};
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use sections::{Section, infer_section};
pub use service::{DEFAULT_SEARCH_LIMIT, RetrievalService, SearchRequest, SearchScope};
pub use similarity::{cosine_similarity, rank_chunks};
pub use stores::{ChunkStore, MemoryChunkStore, SqliteChunkStore};
pub use types::{Chunk, NewChunk, RankedChunk, RetrievalError};
