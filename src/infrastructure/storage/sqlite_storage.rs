use super::{record_size, StorageBackend, StorageError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// SQLite-backed storage. All records live in a single `audio_cache` table.
pub struct SqliteStorage {
    pool: SqlitePool,
    quota_bytes: usize,
}

impl SqliteStorage {
    /// Open (creating if needed) the database at `database_url` and ensure the schema exists
    pub async fn connect(database_url: &str, quota_bytes: usize) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to an in-memory database gets its own database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            4
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        let storage = Self { pool, quota_bytes };
        storage.migrate().await?;

        tracing::info!(
            database_url = %database_url,
            quota_bytes = quota_bytes,
            "SQLite audio storage ready"
        );

        Ok(storage)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audio_cache (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = sqlx::query_scalar::<_, Vec<u8>>("SELECT value FROM audio_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        let used_by_others = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(value)), 0)
            FROM audio_cache
            WHERE key <> ?
            "#,
        )
        .bind(key)
        .fetch_one(&mut *tx)
        .await?;

        let requested = record_size(key, value);
        let available = self
            .quota_bytes
            .saturating_sub(usize::try_from(used_by_others).unwrap_or(usize::MAX));

        if requested > available {
            tx.rollback().await?;
            return Err(StorageError::QuotaExceeded {
                requested,
                available,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO audio_cache (key, value)
            VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM audio_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = sqlx::query_scalar::<_, String>("SELECT key FROM audio_cache")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }

    async fn len(&self) -> Result<usize, StorageError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audio_cache")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as usize)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
