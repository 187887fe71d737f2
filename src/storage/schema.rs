use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::StorageError;

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection pool and run migrations.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Locked` if another process has the database
    /// locked (SQLITE_BUSY, SQLITE_LOCKED, SQLITE_CANTOPEN). Other failures
    /// surface as `StorageError::Other` or `StorageError::Migration`.
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let url = format!("sqlite:{path}?mode=rwc");

        // busy_timeout=5000: SQLite waits up to 5 seconds for a competing
        // writer before returning SQLITE_BUSY. foreign_keys is a
        // per-connection setting, so both pragmas ride the connect options
        // and reach every connection the pool opens.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(StorageError::from_sqlx)?
            .pragma("busy_timeout", "5000")
            .pragma("foreign_keys", "ON");

        // An in-memory SQLite database exists per connection. Pin the pool to
        // one permanent connection so every query sees the same data.
        let pool_options = if path == ":memory:" {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            // SQLite is single-writer; 5 connections covers the aggregation
            // loop plus concurrent interactive commands.
            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(StorageError::from_sqlx)?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run schema migrations atomically within a transaction.
    ///
    /// Every statement uses `IF NOT EXISTS`, so re-running against an
    /// existing database is a no-op. If any step fails the transaction rolls
    /// back and the database keeps its previous consistent schema.
    async fn migrate(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from_sqlx)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                url TEXT UNIQUE NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                last_fetched_at INTEGER
            )
        "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feed_follows (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                feed_id INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(user_id, feed_id)
            )
        "#,
        )
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

        // The staleness scan orders by (last_fetched_at, id).
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_feeds_last_fetched ON feeds(last_fetched_at, id)",
        )
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_feed_follows_user ON feed_follows(user_id)")
            .execute(&mut *tx)
            .await
            .map_err(migration_error)?;

        tx.commit().await.map_err(migration_error)?;

        Ok(())
    }
}

/// Migration failures could also be lock-related; keep the lock
/// classification and fold the rest into `Migration`.
fn migration_error(err: sqlx::Error) -> StorageError {
    match StorageError::from_sqlx(err) {
        StorageError::Other(e) => StorageError::Migration(e.to_string()),
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================
