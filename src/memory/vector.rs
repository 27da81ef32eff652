//! SQLite-backed vector memory for enriched behavior events.
//!
//! One row per event, keyed by behavior id. Search is a brute scan over a
//! user's rows with L2 ranking; behavior history per user is small enough
//! that an ANN index would be overkill.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::memory::binary::{decode_embedding, encode_embedding};
use crate::memory::math::l2_distance;
use crate::traits::{VectorHit, VectorMemory};

pub struct SqliteVectorMemory {
    pool: SqlitePool,
    dim: usize,
}

impl SqliteVectorMemory {
    pub async fn new(pool: SqlitePool, dim: usize) -> anyhow::Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS behavior_vectors (
                behavior_id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_behavior_vectors_user
             ON behavior_vectors(user_id)",
        )
        .execute(&pool)
        .await?;

        info!(dim, "Vector memory initialized");
        Ok(Self { pool, dim })
    }
}

#[async_trait]
impl VectorMemory for SqliteVectorMemory {
    async fn insert(
        &self,
        behavior_id: i64,
        user_id: i64,
        content: &str,
        vector: &[f32],
        timestamp: i64,
    ) -> anyhow::Result<()> {
        if vector.len() != self.dim {
            anyhow::bail!(
                "Embedding dimension mismatch: got {}, store expects {}",
                vector.len(),
                self.dim
            );
        }

        // Upsert by behavior id: re-enrichment replaces the record whole, so
        // there is never more than one row per event.
        sqlx::query(
            "INSERT INTO behavior_vectors (behavior_id, user_id, content, embedding, timestamp)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(behavior_id) DO UPDATE SET
               user_id = excluded.user_id,
               content = excluded.content,
               embedding = excluded.embedding,
               timestamp = excluded.timestamp",
        )
        .bind(behavior_id)
        .bind(user_id)
        .bind(content)
        .bind(encode_embedding(vector))
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn search(
        &self,
        user_id: i64,
        query: &[f32],
        limit: usize,
    ) -> anyhow::Result<Vec<VectorHit>> {
        let rows = sqlx::query(
            "SELECT behavior_id, content, embedding, timestamp
             FROM behavior_vectors WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut hits: Vec<VectorHit> = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let vec = decode_embedding(&blob, self.dim)?;
            hits.push(VectorHit {
                behavior_id: row.get("behavior_id"),
                content: row.get("content"),
                timestamp: row.get("timestamp"),
                distance: l2_distance(query, &vec),
            });
        }

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    async fn setup() -> (SqliteVectorMemory, tempfile::NamedTempFile) {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let opts = SqliteConnectOptions::new()
            .filename(db_file.path())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(opts)
            .await
            .unwrap();
        let memory = SqliteVectorMemory::new(pool, 3).await.unwrap();
        (memory, db_file)
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_per_event() {
        let (memory, _db) = setup().await;

        memory
            .insert(1, 7, "first", &[1.0, 0.0, 0.0], 100)
            .await
            .unwrap();
        memory
            .insert(1, 7, "second", &[0.0, 1.0, 0.0], 200)
            .await
            .unwrap();

        let hits = memory.search(7, &[0.0, 1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "second");
        assert_eq!(hits[0].timestamp, 200);
    }

    #[tokio::test]
    async fn test_search_ranks_by_distance_and_filters_user() {
        let (memory, _db) = setup().await;

        memory
            .insert(1, 7, "near", &[1.0, 0.0, 0.0], 100)
            .await
            .unwrap();
        memory
            .insert(2, 7, "far", &[0.0, 5.0, 0.0], 101)
            .await
            .unwrap();
        memory
            .insert(3, 8, "other user", &[1.0, 0.0, 0.0], 102)
            .await
            .unwrap();

        let hits = memory.search(7, &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "near");
        assert_eq!(hits[0].distance, 0.0);
        assert!(hits[1].distance > hits[0].distance);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let (memory, _db) = setup().await;
        let err = memory.insert(1, 7, "bad", &[1.0, 0.0], 100).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_search_limit() {
        let (memory, _db) = setup().await;
        for i in 0..5 {
            memory
                .insert(i, 7, "row", &[i as f32, 0.0, 0.0], 100 + i)
                .await
                .unwrap();
        }
        let hits = memory.search(7, &[0.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
