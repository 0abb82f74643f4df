//! Persisted vector store.
//!
//! A named on-disk directory (`<store.dir>/<store.name>/`) holding one
//! SQLite database of chunks and their embedding vectors. The store supports
//! exactly what retrieval needs:
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`create`](VectorStore::create) | Start a fresh store, discarding any previous one |
//! | [`open`](VectorStore::open) | Open an existing store for querying |
//! | [`upsert`](VectorStore::upsert) | Store a chunk with its vector |
//! | [`upsert_all`](VectorStore::upsert_all) | Store a whole ingestion atomically |
//! | [`nearest_k`](VectorStore::nearest_k) | Brute-force cosine similarity, best first |
//!
//! Ingestion always goes through `create`, so rows are only ever appended
//! to an empty store.

use anyhow::{bail, Context, Result};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;

use crate::config::StoreConfig;
use crate::db;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::{AssistError, AssistResult};
use crate::models::KnowledgeChunk;

const DB_FILE: &str = "store.sqlite";

/// A chunk returned from [`VectorStore::nearest_k`] with its similarity.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub score: f32,
}

pub struct VectorStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl VectorStore {
    /// Create an empty store, replacing the database of a previous ingestion.
    pub async fn create(config: &StoreConfig) -> Result<Self> {
        let dir = config.path();
        let path = dir.join(DB_FILE);
        for suffix in ["", "-wal", "-shm"] {
            let file = dir.join(format!("{}{}", DB_FILE, suffix));
            if file.exists() {
                std::fs::remove_file(&file)
                    .with_context(|| format!("Failed to remove old store file {}", file.display()))?;
            }
        }

        let pool = db::connect(&path, true).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                chunk_index INTEGER PRIMARY KEY,
                source_offset INTEGER NOT NULL,
                text TEXT NOT NULL,
                hash TEXT NOT NULL,
                dims INTEGER NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        tracing::debug!(path = %path.display(), "created vector store");
        Ok(Self { pool, path })
    }

    /// Open an existing store.
    ///
    /// # Errors
    ///
    /// [`AssistError::StoreNotFound`] if the store was never ingested or
    /// cannot be opened.
    pub async fn open(config: &StoreConfig) -> AssistResult<Self> {
        let path = config.path().join(DB_FILE);
        if !path.exists() {
            return Err(AssistError::StoreNotFound(config.path().display().to_string()));
        }
        let pool = db::connect(&path, false)
            .await
            .map_err(|e| AssistError::StoreNotFound(format!("{}: {}", path.display(), e)))?;
        Ok(Self { pool, path })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Store `chunk` with its embedding.
    pub async fn upsert(&self, chunk: &KnowledgeChunk, vector: &[f32]) -> Result<()> {
        self.upsert_all(std::slice::from_ref(chunk), &[vector.to_vec()])
            .await
    }

    /// Store every chunk with its embedding in one transaction; on error
    /// nothing is written.
    pub async fn upsert_all(
        &self,
        chunks: &[KnowledgeChunk],
        vectors: &[Vec<f32>],
    ) -> Result<()> {
        if chunks.len() != vectors.len() {
            bail!("{} chunks but {} vectors", chunks.len(), vectors.len());
        }
        let mut tx = self.pool.begin().await?;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            sqlx::query(
                r#"
                INSERT INTO chunks (chunk_index, source_offset, text, hash, dims, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(chunk_index) DO UPDATE SET
                    source_offset = excluded.source_offset,
                    text = excluded.text,
                    hash = excluded.hash,
                    dims = excluded.dims,
                    embedding = excluded.embedding
                "#,
            )
            .bind(chunk.index)
            .bind(chunk.source_offset)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(vector.len() as i64)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// The `k` chunks most similar to `query_vec`, in descending similarity.
    /// Ties keep corpus order.
    pub async fn nearest_k(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            "SELECT chunk_index, source_offset, text, hash, embedding FROM chunks ORDER BY chunk_index",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let score = cosine_similarity(query_vec, &blob_to_vec(&blob));
                ScoredChunk {
                    chunk: KnowledgeChunk {
                        index: row.get("chunk_index"),
                        source_offset: row.get("source_offset"),
                        text: row.get("text"),
                        hash: row.get("hash"),
                    },
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO meta (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM meta WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Vector width recorded at ingestion, if any.
    pub async fn dims(&self) -> Result<Option<usize>> {
        match self.get_meta("dims").await? {
            Some(v) => Ok(Some(
                v.parse()
                    .with_context(|| format!("Bad dims value in store meta: {}", v))?,
            )),
            None => Ok(None),
        }
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
