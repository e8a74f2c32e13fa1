//! SQLite-backed knowledge store.
//!
//! Chunks live in one table; embeddings are stored as little-endian f32
//! BLOBs. Similarity search loads embedded rows and scores them in process,
//! which is adequate for reference corpora in the low tens of thousands of
//! chunks.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE knowledge_chunks (
//!     id TEXT PRIMARY KEY,
//!     content TEXT NOT NULL,
//!     metadata TEXT,
//!     embedding BLOB,
//!     created_at TEXT NOT NULL
//! );
//! ```

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::store::{rank_matches, KnowledgeStore};
use crate::types::{KnowledgeChunk, KnowledgeMatch};

/// SQLite-based knowledge store.
#[derive(Clone)]
pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
}

impl SqliteKnowledgeStore {
    /// Opens (creating if missing) the database at `database_url` and
    /// initializes the schema.
    pub async fn new(database_url: &str) -> Result<Self, anyhow::Error> {
        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_url);

        let pool = SqlitePool::connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Builds the store on an existing pool (shared with other repositories)
    /// and initializes the schema.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, anyhow::Error> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_chunks (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT,
                embedding BLOB,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_knowledge_created_at ON knowledge_chunks(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding
            .iter()
            .flat_map(|f| f.to_le_bytes().to_vec())
            .collect()
    }

    fn decode_embedding(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeChunk, anyhow::Error> {
        let id: String = row.try_get("id")?;
        let content: String = row.try_get("content")?;
        let metadata_str: Option<String> = row.try_get("metadata")?;
        let embedding_blob: Option<Vec<u8>> = row.try_get("embedding")?;
        let created_at_str: String = row.try_get("created_at")?;

        let id = Uuid::from_str(&id)?;
        let metadata = metadata_str
            .map(|s| serde_json::from_str(&s))
            .transpose()?;
        let embedding = embedding_blob.map(|blob| Self::decode_embedding(&blob));
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)?.with_timezone(&Utc);

        Ok(KnowledgeChunk {
            id,
            content,
            embedding,
            metadata,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn add(&self, chunk: KnowledgeChunk) -> Result<(), anyhow::Error> {
        let metadata_str = chunk
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let embedding_blob = chunk
            .embedding
            .as_ref()
            .map(|e| Self::encode_embedding(e));

        sqlx::query(
            r#"
            INSERT INTO knowledge_chunks (id, content, metadata, embedding, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(chunk.id.to_string())
        .bind(&chunk.content)
        .bind(metadata_str)
        .bind(embedding_blob)
        .bind(chunk.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeChunk>, anyhow::Error> {
        let row = sqlx::query("SELECT * FROM knowledge_chunks WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_chunk(&r)?)),
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM knowledge_chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 as usize)
    }

    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        similarity_threshold: f32,
    ) -> Result<Vec<KnowledgeMatch>, anyhow::Error> {
        let rows = sqlx::query("SELECT * FROM knowledge_chunks WHERE embedding IS NOT NULL")
            .fetch_all(&self.pool)
            .await?;

        let mut chunks = Vec::with_capacity(rows.len());
        for row in &rows {
            chunks.push(Self::row_to_chunk(row)?);
        }

        Ok(rank_matches(
            chunks,
            query_embedding,
            match_count,
            similarity_threshold,
        ))
    }
}
