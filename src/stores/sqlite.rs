//! SQLite-backed chunk store.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, params_from_iter};
use uuid::Uuid;

use super::{ChunkStore, validate_batch};
use crate::sections::Section;
use crate::types::{Chunk, NewChunk, RetrievalError};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    section TEXT NOT NULL,
    position INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding TEXT NOT NULL,
    embedding_model TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);
CREATE INDEX IF NOT EXISTS idx_chunks_owner ON chunks(owner_id);
";

const SELECT_COLUMNS: &str =
    "id, document_id, owner_id, section, position, content, embedding, embedding_model";

/// Row image before section and embedding decoding.
type RawRow = (
    String, // id
    String, // document_id
    String, // owner_id
    String, // section
    i64,    // position
    String, // content
    String, // embedding (JSON array)
    String, // embedding_model
);

/// Persistent [`ChunkStore`] over SQLite via `tokio-rusqlite`.
///
/// Embeddings are stored as JSON arrays in a TEXT column; similarity scoring
/// happens in process (see [`similarity`](crate::similarity)), so the
/// database only ever filters by the indexed `document_id`/`owner_id` keys
/// and the optional section label.
#[derive(Clone)]
pub struct SqliteChunkStore {
    conn: Connection,
}

impl SqliteChunkStore {
    /// Opens (or creates) the store at `path` and applies the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RetrievalError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))?;
        Self::init(conn).await
    }

    /// Opens a transient in-memory store, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, RetrievalError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, RetrievalError> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(|err| RetrievalError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    async fn query_chunks(
        &self,
        sql: String,
        params: Vec<String>,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        let rows: Vec<RawRow> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let mapped = stmt
                    .query_map(params_from_iter(params.iter()), |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                            row.get(7)?,
                        ))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut rows = Vec::new();
                for row in mapped {
                    rows.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(rows)
            })
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))?;

        rows.into_iter().map(decode_row).collect()
    }
}

fn decode_row(row: RawRow) -> Result<Chunk, RetrievalError> {
    let (id, document_id, owner_id, section, position, content, embedding, embedding_model) = row;

    let section: Section = section
        .parse()
        .map_err(|err| RetrievalError::Storage(format!("chunk {id}: {err}")))?;
    let embedding: Vec<f32> = serde_json::from_str(&embedding).map_err(|err| {
        RetrievalError::Storage(format!("chunk {id}: undecodable embedding: {err}"))
    })?;
    let position = usize::try_from(position)
        .map_err(|_| RetrievalError::Storage(format!("chunk {id}: negative position")))?;

    Ok(Chunk {
        id,
        document_id,
        owner_id,
        text: content,
        embedding,
        embedding_model,
        section,
        position,
    })
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    async fn save(&self, chunks: Vec<NewChunk>) -> Result<Vec<Chunk>, RetrievalError> {
        validate_batch(&chunks)?;
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let saved: Vec<Chunk> = chunks
            .into_iter()
            .map(|chunk| chunk.into_chunk(Uuid::new_v4().to_string()))
            .collect();

        let mut rows: Vec<(Chunk, String)> = Vec::with_capacity(saved.len());
        for chunk in &saved {
            let encoded = serde_json::to_string(&chunk.embedding)
                .map_err(|err| RetrievalError::Storage(err.to_string()))?;
            rows.push((chunk.clone(), encoded));
        }

        // One transaction per batch: a failed insert leaves no partial rows.
        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                {
                    let mut stmt = tx
                        .prepare(
                            "INSERT INTO chunks (id, document_id, owner_id, section, position, \
                             content, embedding, embedding_model) \
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        )
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                    for (chunk, embedding_json) in &rows {
                        stmt.execute((
                            chunk.id.as_str(),
                            chunk.document_id.as_str(),
                            chunk.owner_id.as_str(),
                            chunk.section.as_str(),
                            chunk.position as i64,
                            chunk.text.as_str(),
                            embedding_json.as_str(),
                            chunk.embedding_model.as_str(),
                        ))
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                    }
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))?;

        Ok(saved)
    }

    async fn find_by_document(
        &self,
        document_id: &str,
        section: Option<Section>,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        let (sql, params) = match section {
            Some(section) => (
                format!(
                    "SELECT {SELECT_COLUMNS} FROM chunks \
                     WHERE document_id = ?1 AND section = ?2 ORDER BY position"
                ),
                vec![document_id.to_string(), section.as_str().to_string()],
            ),
            None => (
                format!(
                    "SELECT {SELECT_COLUMNS} FROM chunks \
                     WHERE document_id = ?1 ORDER BY position"
                ),
                vec![document_id.to_string()],
            ),
        };
        self.query_chunks(sql, params).await
    }

    async fn find_by_owner(
        &self,
        owner_id: &str,
        section: Option<Section>,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        let (sql, params) = match section {
            Some(section) => (
                format!(
                    "SELECT {SELECT_COLUMNS} FROM chunks \
                     WHERE owner_id = ?1 AND section = ?2 ORDER BY document_id, position"
                ),
                vec![owner_id.to_string(), section.as_str().to_string()],
            ),
            None => (
                format!(
                    "SELECT {SELECT_COLUMNS} FROM chunks \
                     WHERE owner_id = ?1 ORDER BY document_id, position"
                ),
                vec![owner_id.to_string()],
            ),
        };
        self.query_chunks(sql, params).await
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<usize, RetrievalError> {
        let document_id = document_id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM chunks WHERE document_id = ?1", [&document_id])
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RetrievalError::Storage(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_chunk(document_id: &str, position: usize, section: Section) -> NewChunk {
        NewChunk {
            document_id: document_id.to_string(),
            owner_id: "user-1".to_string(),
            text: format!("chunk {position} of {document_id}"),
            embedding: vec![0.25, -0.5, 0.75],
            embedding_model: "test-model".to_string(),
            section,
            position,
        }
    }

    #[tokio::test]
    async fn save_and_fetch_round_trip() {
        let store = SqliteChunkStore::open_in_memory().await.unwrap();
        let saved = store
            .save(vec![
                new_chunk("doc-1", 0, Section::Experience),
                new_chunk("doc-1", 1, Section::Skills),
            ])
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);

        let fetched = store.find_by_document("doc-1", None).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].position, 0);
        assert_eq!(fetched[0].embedding, vec![0.25, -0.5, 0.75]);
        assert_eq!(fetched[0].section, Section::Experience);
        assert_eq!(fetched[1].section, Section::Skills);
    }

    #[tokio::test]
    async fn section_filter_applies() {
        let store = SqliteChunkStore::open_in_memory().await.unwrap();
        store
            .save(vec![
                new_chunk("doc-1", 0, Section::Experience),
                new_chunk("doc-1", 1, Section::Skills),
            ])
            .await
            .unwrap();

        let skills = store
            .find_by_document("doc-1", Some(Section::Skills))
            .await
            .unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].position, 1);

        let none = store
            .find_by_document("doc-1", Some(Section::Education))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn find_by_owner_spans_documents() {
        let store = SqliteChunkStore::open_in_memory().await.unwrap();
        store
            .save(vec![new_chunk("doc-1", 0, Section::Other)])
            .await
            .unwrap();
        store
            .save(vec![new_chunk("doc-2", 0, Section::Other)])
            .await
            .unwrap();

        let mine = store.find_by_owner("user-1", None).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(store.find_by_owner("stranger", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_document_reports_count() {
        let store = SqliteChunkStore::open_in_memory().await.unwrap();
        store
            .save(vec![
                new_chunk("doc-1", 0, Section::Other),
                new_chunk("doc-1", 1, Section::Other),
                new_chunk("doc-2", 0, Section::Other),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_by_document("doc-1").await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.delete_by_document("doc-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_rejects_invalid_batch_without_writing() {
        let store = SqliteChunkStore::open_in_memory().await.unwrap();
        let mut bad = new_chunk("doc-1", 0, Section::Other);
        bad.text.clear();

        assert!(store.save(vec![bad]).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.db");

        {
            let store = SqliteChunkStore::open(&path).await.unwrap();
            store
                .save(vec![new_chunk("doc-1", 0, Section::Summary)])
                .await
                .unwrap();
        }

        let reopened = SqliteChunkStore::open(&path).await.unwrap();
        let fetched = reopened.find_by_document("doc-1", None).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].section, Section::Summary);
    }
}
